//! Pipeline stages for lesson-plan assessment.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different API transport) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ prompt ──▶ keys ──▶ generate ──▶ format
//! (PDF/docx)  (template) (fetch)  (fallback)   (classify)
//! ```
//!
//! 1. [`extract`]  — pull plain text out of the uploaded PDF or Word bytes
//! 2. [`keys`]     — derive the direct-download URL and fetch the JSON
//!    credential list; empty or malformed lists never reach the sweep
//! 3. [`generate`] — the credential × model fallback sweep; the only stage
//!    with generative-API I/O
//! 4. [`format`]   — deterministic line classification turning the raw
//!    Markdown-like response into a structured report

pub mod extract;
pub mod format;
pub mod generate;
pub mod keys;
