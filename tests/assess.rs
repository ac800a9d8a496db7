//! Integration tests for the assessment pipeline.
//!
//! The generation transport is a trait, so everything from prompt build to
//! .docx export runs here with scripted generators — no network, no API
//! keys, deterministic attempt order via a seeded RNG.

use async_trait::async_trait;
use lessonlens::{
    generate_with_fallback, run_assessment, AssessmentConfig, AttemptError, DocumentKind,
    FormatterOptions, LessonLensError, Report, ReportLine, TextGenerator,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicUsize, Ordering};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// A model answer in the shape the prompt requests, with the usual quirks:
/// a polite preamble, separator rules, bold labels, inline math, a rubric
/// echo, and an empty bullet.
const SAMPLE_RESPONSE: &str = "\
Chào bạn, dưới đây là phần phân tích chi tiết.

---

## 1. Tổng quan
* Đánh giá chất lượng: $8$/10
* Nhận định chung: mạch lạc, đủ bước lên lớp.

## 2. Phân tích Sâu
* **Mục tiêu:** đo lường được.
* **Công nghệ:** dùng trình chiếu hợp lý (nếu có).
*

### Ghi chú
Một đoạn nhận xét thêm.

## 3. Các lỗi cần khắc phục ngay
* Thiếu thời lượng cho hoạt động nhóm.
";

struct CannedGenerator {
    body: &'static str,
    fail_first: usize,
    counter: AtomicUsize,
}

impl CannedGenerator {
    fn new(body: &'static str) -> Self {
        Self {
            body,
            fail_first: 0,
            counter: AtomicUsize::new(0),
        }
    }

    fn failing_first(body: &'static str, n: usize) -> Self {
        Self {
            body,
            fail_first: n,
            counter: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(
        &self,
        _credential: &str,
        _model: &str,
        prompt: &str,
    ) -> Result<String, AttemptError> {
        // The sweep must pass the document-bearing prompt through verbatim.
        assert!(prompt.contains("NỘI DUNG GIÁO ÁN"));
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_first {
            Err(AttemptError::Network {
                detail: "connection reset".into(),
            })
        } else {
            Ok(self.body.to_string())
        }
    }
}

fn fast_config() -> AssessmentConfig {
    AssessmentConfig::builder()
        .attempt_delay_ms(0)
        .build()
        .unwrap()
}

fn credentials() -> Vec<String> {
    vec![
        "AIzaFirst".to_string(),
        "AIzaSecond".to_string(),
        "AIzaThird".to_string(),
    ]
}

// ── Pipeline ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_flow_produces_a_classified_report() {
    let generator = CannedGenerator::new(SAMPLE_RESPONSE);
    let mut rng = StdRng::seed_from_u64(11);

    let output = run_assessment(
        "Bài 5: Câu ghép — mục tiêu, hoạt động, củng cố.",
        &credentials(),
        &generator,
        &fast_config(),
        &mut rng,
    )
    .await
    .unwrap();

    assert_eq!(generator.calls(), 1);
    assert_eq!(output.stats.attempts, 1);

    let lines = &output.report.lines;
    // Preamble and separators are gone; the report starts at section 1.
    assert_eq!(lines[0], ReportLine::Heading1("1. Tổng quan".into()));
    // Inline math unwrapped.
    assert!(lines
        .iter()
        .any(|l| *l == ReportLine::Bullet("Đánh giá chất lượng: 8/10".into())));
    // Bold label stripped, rubric echo removed.
    assert!(lines
        .iter()
        .any(|l| *l == ReportLine::Bullet("Mục tiêu: đo lường được.".into())));
    assert!(lines
        .iter()
        .any(|l| matches!(l, ReportLine::Bullet(t) if t.starts_with("Công nghệ:") && !t.contains("nếu có"))));
    // The empty bullet was dropped.
    assert!(!lines.iter().any(|l| *l == ReportLine::Bullet(String::new())));
    // Second-level heading and paragraph survive.
    assert!(lines.contains(&ReportLine::Heading2("Ghi chú".into())));
    assert!(lines.contains(&ReportLine::Paragraph("Một đoạn nhận xét thêm.".into())));
}

#[tokio::test]
async fn sweep_failures_fall_through_to_a_working_credential() {
    let generator = CannedGenerator::failing_first(SAMPLE_RESPONSE, 3);
    let mut rng = StdRng::seed_from_u64(12);

    let output = run_assessment(
        "giáo án",
        &credentials(),
        &generator,
        &fast_config(),
        &mut rng,
    )
    .await
    .unwrap();

    assert_eq!(generator.calls(), 4);
    assert_eq!(output.stats.attempts, 4);
    assert!(!output.report.is_empty());
}

#[tokio::test]
async fn exhaustion_reports_the_attempt_count() {
    let generator = CannedGenerator::failing_first(SAMPLE_RESPONSE, usize::MAX);
    let mut rng = StdRng::seed_from_u64(13);
    let models = AssessmentConfig::default().models.len();

    let err = run_assessment(
        "giáo án",
        &credentials(),
        &generator,
        &fast_config(),
        &mut rng,
    )
    .await
    .unwrap_err();

    match err {
        LessonLensError::Exhausted { attempts, .. } => {
            assert_eq!(attempts, credentials().len() * models);
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
}

// ── Round trip ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn rendered_markdown_reclassifies_to_the_same_report() {
    let generator = CannedGenerator::new(SAMPLE_RESPONSE);
    let mut rng = StdRng::seed_from_u64(14);

    let output = run_assessment(
        "giáo án",
        &credentials(),
        &generator,
        &fast_config(),
        &mut rng,
    )
    .await
    .unwrap();

    let reparsed = Report::from_generated(&output.markdown, &FormatterOptions::default());
    assert_eq!(reparsed.lines, output.report.lines);

    // And a second rendering round keeps the fixed point.
    let twice = Report::from_generated(&reparsed.to_markdown(), &FormatterOptions::default());
    assert_eq!(twice.lines, output.report.lines);
}

// ── Export ───────────────────────────────────────────────────────────────────

#[test]
fn docx_export_round_trips_through_the_document_reader() {
    let report = Report {
        title: lessonlens::REPORT_TITLE.to_string(),
        lines: vec![
            ReportLine::Heading1("1. Tổng quan".into()),
            ReportLine::Bullet("Nhận định chung: tốt".into()),
            ReportLine::Paragraph("Một đoạn văn.".into()),
        ],
    };

    let buffer = report.to_docx().unwrap();
    assert_eq!(&buffer[..2], b"PK");

    // The exported package must itself be readable as an uploaded document.
    let kind = lessonlens::pipeline::extract::sniff_kind(&buffer, None).unwrap();
    assert_eq!(kind, DocumentKind::Docx);
    let text = lessonlens::pipeline::extract::extract_text(&buffer, kind).unwrap();
    assert!(text.contains("Kết quả thẩm định giáo án"));
    assert!(text.contains("1. Tổng quan"));
    assert!(text.contains("Nhận định chung: tốt"));
    assert!(text.contains("Một đoạn văn."));
}

#[tokio::test]
async fn write_docx_creates_the_file_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("tham-dinh.docx");

    let report = Report {
        title: lessonlens::REPORT_TITLE.to_string(),
        lines: vec![ReportLine::Paragraph("ok".into())],
    };
    lessonlens::write_docx(&report, &path).await.unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..2], b"PK");
    // No temp file left behind.
    assert!(!path.with_extension("docx.tmp").exists());
}

// ── Sweep surface re-check through the public API ───────────────────────────

#[tokio::test]
async fn public_sweep_api_is_usable_directly() {
    let generator = CannedGenerator::new("## 1. OK\n* xong");
    let mut rng = StdRng::seed_from_u64(15);
    let prompt = lessonlens::prompts::review_prompt("giáo án");

    let generation = generate_with_fallback(
        &generator,
        &prompt,
        &credentials(),
        &fast_config(),
        &mut rng,
    )
    .await
    .unwrap();

    assert_eq!(generation.attempts, 1);
    assert!(generation.credential_hint().starts_with('…'));
    assert!(generation.text.starts_with("## 1. OK"));
}
