//! # lessonlens
//!
//! Assess lesson plans (PDF or Word) with Gemini models.
//!
//! ## Why this crate?
//!
//! Reviewing a lesson plan by hand is slow and inconsistent. lessonlens
//! extracts the plan's text, asks a generative model for a structured
//! pedagogical review, and turns the answer into a clean Word report. The
//! awkward parts — free-tier API keys that exhaust mid-day, preview models
//! that come and go — are absorbed by a credential-rotation / model-fallback
//! sweep, so one dead key or one retired model never fails the action.
//!
//! ## Pipeline Overview
//!
//! ```text
//! lesson plan (PDF/.docx)
//!  │
//!  ├─ 1. Extract   text layer via pdf-extract / docx-rs
//!  ├─ 2. Prompt    fixed pedagogy-review template
//!  ├─ 3. Keys      fetch the hosted JSON credential list
//!  ├─ 4. Generate  shuffled credentials × ranked models, first success wins
//!  ├─ 5. Format    deterministic line classification
//!  └─ 6. Export    Markdown text or .docx buffer
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lessonlens::{assess, AssessmentConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AssessmentConfig::default();
//!     let output = assess("giao-an.pdf", &config).await?;
//!     println!("{}", output.markdown);
//!     eprintln!("model: {} after {} attempt(s)",
//!         output.model, output.stats.attempts);
//!     std::fs::write("report.docx", output.report.to_docx()?)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `lessonlens` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! lessonlens = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod assess;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod report;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use assess::{assess, assess_bytes, assess_to_docx, run_assessment, write_docx};
pub use assess::{AssessmentOutput, AssessmentStats};
pub use config::{
    AssessmentConfig, AssessmentConfigBuilder, DEFAULT_API_BASE_URL, DEFAULT_KEYS_URL,
    DEFAULT_MODELS,
};
pub use error::{AttemptError, LessonLensError};
pub use pipeline::extract::DocumentKind;
pub use pipeline::format::{FormatterOptions, DEFAULT_ANNOTATION_DENYLIST};
pub use pipeline::generate::{generate_with_fallback, GeminiClient, Generation, TextGenerator};
pub use report::{Report, ReportLine, REPORT_TITLE};
