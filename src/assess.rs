//! Top-level assessment entry points.
//!
//! One user action = one pass through the whole pipeline: read the document,
//! build the prompt, fetch a fresh credential list, run the fallback sweep,
//! classify the response. Everything is request-scoped — nothing here
//! outlives a single call, and repeated calls share no state.

use crate::config::AssessmentConfig;
use crate::error::LessonLensError;
use crate::pipeline::generate::{generate_with_fallback, GeminiClient, TextGenerator};
use crate::pipeline::{extract, keys};
use crate::prompts;
use crate::report::Report;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Timing and attempt counters for one assessment.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentStats {
    /// Time spent extracting document text, in milliseconds.
    pub extract_duration_ms: u64,
    /// Time spent fetching the credential list.
    pub keys_duration_ms: u64,
    /// Time spent in the generation sweep (including inter-attempt delays).
    pub generate_duration_ms: u64,
    /// Wall-clock time for the whole action.
    pub total_duration_ms: u64,
    /// Generation attempts made, including the successful one.
    pub attempts: usize,
    /// Classified lines retained by the formatter.
    pub report_lines: usize,
}

/// Everything produced by one assessment.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentOutput {
    /// The classified report, ready for export.
    pub report: Report,
    /// The report rendered back to Markdown.
    pub markdown: String,
    /// Model identifier that produced the accepted response.
    pub model: String,
    /// Tail of the credential that succeeded (never the full key).
    pub credential_hint: String,
    /// Timings and counters.
    pub stats: AssessmentStats,
}

/// Assess a lesson plan from a local file path.
///
/// This is the primary entry point for the CLI. The filename doubles as a
/// format hint when the magic bytes are inconclusive.
pub async fn assess(
    input: impl AsRef<Path>,
    config: &AssessmentConfig,
) -> Result<AssessmentOutput, LessonLensError> {
    let path = input.as_ref();
    let bytes = read_input(path)?;
    let name_hint = path.file_name().and_then(|n| n.to_str());
    assess_bytes(&bytes, name_hint, config).await
}

/// Assess a lesson plan already held in memory (e.g. an upload buffer).
///
/// # Errors
/// Fatal errors only — an unreadable document, an unavailable credential
/// list, or full sweep exhaustion. Individual attempt failures inside the
/// sweep are logged and swallowed.
pub async fn assess_bytes(
    bytes: &[u8],
    name_hint: Option<&str>,
    config: &AssessmentConfig,
) -> Result<AssessmentOutput, LessonLensError> {
    let total_start = Instant::now();
    info!("Starting assessment ({} bytes)", bytes.len());

    // ── Step 1: Extract document text ────────────────────────────────────
    let extract_start = Instant::now();
    let kind = extract::sniff_kind(bytes, name_hint)?;
    let text = extract::extract_text(bytes, kind)?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    info!("Extracted {} chars from {:?}", text.len(), kind);

    // ── Step 2: Fetch a fresh credential list ────────────────────────────
    let keys_start = Instant::now();
    let credentials =
        keys::load_credentials(&config.keys_url, config.request_timeout_secs).await?;
    let keys_duration_ms = keys_start.elapsed().as_millis() as u64;

    // ── Step 3: Sweep and classify ───────────────────────────────────────
    let client = GeminiClient::new(config)?;
    let mut rng = StdRng::from_os_rng();
    let mut output = run_assessment(&text, &credentials, &client, config, &mut rng).await?;

    output.stats.extract_duration_ms = extract_duration_ms;
    output.stats.keys_duration_ms = keys_duration_ms;
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Assessment complete: {} after {} attempt(s), {}ms total",
        output.model, output.stats.attempts, output.stats.total_duration_ms
    );
    Ok(output)
}

/// Run the sweep + formatter over already-extracted text.
///
/// The transport and RNG are parameters so callers (and tests) control both
/// the network and the credential order; [`assess_bytes`] passes the real
/// [`GeminiClient`] and an OS-seeded RNG.
pub async fn run_assessment<R>(
    document_text: &str,
    credentials: &[String],
    generator: &dyn TextGenerator,
    config: &AssessmentConfig,
    rng: &mut R,
) -> Result<AssessmentOutput, LessonLensError>
where
    R: Rng + ?Sized,
{
    let generate_start = Instant::now();
    let prompt = prompts::review_prompt(document_text);
    let generation =
        generate_with_fallback(generator, &prompt, credentials, config, rng).await?;
    let generate_duration_ms = generate_start.elapsed().as_millis() as u64;

    let report = Report::from_generated(&generation.text, &config.formatter);
    if report.is_empty() {
        warn!("Response carried no marked sections; the report is empty");
    }
    let markdown = report.to_markdown();
    let report_lines = report.lines.len();

    Ok(AssessmentOutput {
        report,
        markdown,
        credential_hint: generation.credential_hint(),
        model: generation.model,
        stats: AssessmentStats {
            extract_duration_ms: 0,
            keys_duration_ms: 0,
            generate_duration_ms,
            total_duration_ms: generate_duration_ms,
            attempts: generation.attempts,
            report_lines,
        },
    })
}

/// Assess a file and write the .docx report next to wherever the caller
/// points. Uses an atomic write (temp file + rename) to prevent partial
/// files.
pub async fn assess_to_docx(
    input: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &AssessmentConfig,
) -> Result<AssessmentOutput, LessonLensError> {
    let output = assess(input, config).await?;
    write_docx(&output.report, output_path).await?;
    Ok(output)
}

/// Write a report's .docx buffer to disk atomically.
pub async fn write_docx(
    report: &Report,
    path: impl AsRef<Path>,
) -> Result<(), LessonLensError> {
    let path = path.as_ref();
    let buffer = report.to_docx()?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LessonLensError::OutputWrite {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("docx.tmp");
    tokio::fs::write(&tmp_path, &buffer)
        .await
        .map_err(|e| LessonLensError::OutputWrite {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| LessonLensError::OutputWrite {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(())
}

/// Read the input file, mapping failure kinds to their error variants.
fn read_input(path: &Path) -> Result<Vec<u8>, LessonLensError> {
    if !path.exists() {
        return Err(LessonLensError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    match std::fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(LessonLensError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(LessonLensError::FileNotFound {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AttemptError;
    use crate::report::ReportLine;
    use async_trait::async_trait;
    use rand::SeedableRng;

    struct CannedGenerator(&'static str);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(
            &self,
            _credential: &str,
            _model: &str,
            _prompt: &str,
        ) -> Result<String, AttemptError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn run_assessment_classifies_and_counts() {
        let generator =
            CannedGenerator("Mở đầu lịch sự.\n## 1. Tổng quan\n* Đánh giá chất lượng: 9/10");
        let config = AssessmentConfig::builder()
            .attempt_delay_ms(0)
            .build()
            .unwrap();
        let creds = vec!["key-a".to_string()];
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);

        let output = run_assessment("giáo án", &creds, &generator, &config, &mut rng)
            .await
            .unwrap();

        assert_eq!(output.stats.attempts, 1);
        assert_eq!(output.stats.report_lines, 2);
        assert_eq!(output.credential_hint, "…key-a");
        assert_eq!(
            output.report.lines[0],
            ReportLine::Heading1("1. Tổng quan".into())
        );
        assert!(output.markdown.starts_with("## 1. Tổng quan"));
    }

    #[tokio::test]
    async fn missing_file_is_reported_as_such() {
        let err = assess("/no/such/lesson-plan.pdf", &AssessmentConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LessonLensError::FileNotFound { .. }));
    }
}
