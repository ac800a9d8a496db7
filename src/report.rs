//! Structured report types and export.
//!
//! A [`Report`] is the assessment in classified form: a fixed document
//! title plus the [`ReportLine`]s produced by
//! [`crate::pipeline::format::classify_report`]. It renders two ways —
//! back to Markdown (terminal display, and the formatter's idempotence
//! contract) and to an in-memory `.docx` buffer for download, with no
//! filesystem involvement.

use crate::error::LessonLensError;
use crate::pipeline::format::{classify_report, FormatterOptions};
use docx_rs::{
    AbstractNumbering, AlignmentType, Docx, IndentLevel, Level, LevelJc, LevelText, NumberFormat,
    Numbering, NumberingId, Run, Start,
};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Fixed top-level title of every exported report.
pub const REPORT_TITLE: &str = "Kết quả thẩm định giáo án";

/// One classified line of the assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportLine {
    /// Top-level section heading (`## ` in the generated Markdown).
    Heading1(String),
    /// Second-level heading (`### `).
    Heading2(String),
    /// Bulleted list item (`* ` or `- `).
    Bullet(String),
    /// Plain paragraph.
    Paragraph(String),
}

/// The assessment in structured, export-ready form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Document title used by the .docx export.
    pub title: String,
    /// Classified content lines, in source order.
    pub lines: Vec<ReportLine>,
}

impl Report {
    /// Classify raw generated text into a report with the fixed title.
    pub fn from_generated(raw: &str, options: &FormatterOptions) -> Self {
        Self {
            title: REPORT_TITLE.to_string(),
            lines: classify_report(raw, options),
        }
    }

    /// True when classification retained nothing.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Render the content lines back to Markdown.
    ///
    /// The title is not rendered — it belongs to the exported document, not
    /// to the generated content. Running the rendered text back through
    /// [`classify_report`] reproduces `self.lines` exactly.
    pub fn to_markdown(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            parts.push(match line {
                ReportLine::Heading1(t) => format!("## {t}"),
                ReportLine::Heading2(t) => format!("### {t}"),
                ReportLine::Bullet(t) => format!("* {t}"),
                ReportLine::Paragraph(t) => t.clone(),
            });
        }
        let mut out = parts.join("\n\n");
        out.push('\n');
        out
    }

    /// Serialise the report as a .docx package in memory.
    ///
    /// Returns the complete file as a single binary buffer ready to offer
    /// for download or write to disk.
    pub fn to_docx(&self) -> Result<Vec<u8>, LessonLensError> {
        let mut docx = Docx::new()
            .add_abstract_numbering(AbstractNumbering::new(1).add_level(Level::new(
                0,
                Start::new(1),
                NumberFormat::new("bullet"),
                LevelText::new("•"),
                LevelJc::new("left"),
            )))
            .add_numbering(Numbering::new(1, 1))
            .add_paragraph(
                docx_rs::Paragraph::new()
                    .align(AlignmentType::Center)
                    .add_run(Run::new().add_text(self.title.as_str()).bold().size(36)),
            );

        for line in &self.lines {
            let paragraph = match line {
                ReportLine::Heading1(t) => docx_rs::Paragraph::new()
                    .add_run(Run::new().add_text(t.as_str()).bold().size(30)),
                ReportLine::Heading2(t) => docx_rs::Paragraph::new()
                    .add_run(Run::new().add_text(t.as_str()).bold().size(26)),
                ReportLine::Bullet(t) => docx_rs::Paragraph::new()
                    .numbering(NumberingId::new(1), IndentLevel::new(0))
                    .add_run(Run::new().add_text(t.as_str())),
                ReportLine::Paragraph(t) => {
                    docx_rs::Paragraph::new().add_run(Run::new().add_text(t.as_str()))
                }
            };
            docx = docx.add_paragraph(paragraph);
        }

        let mut cursor = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut cursor)
            .map_err(|e| LessonLensError::DocxWrite {
                detail: format!("{e:?}"),
            })?;
        Ok(cursor.into_inner())
    }
}
