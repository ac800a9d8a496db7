//! Document reading: plain text out of PDF or Word bytes.
//!
//! ## Why text only?
//!
//! The reviewer model receives the lesson plan as prose inside a prompt, so
//! only the text layer matters: tables arrive as their cell text, images are
//! ignored. Page (PDF) and paragraph (.docx) boundaries become newline
//! separators so the model still sees the document's rough shape.
//!
//! Format detection prefers magic bytes over the filename — uploads are
//! routinely misnamed, but `%PDF` and the OOXML zip header are reliable.

use crate::error::LessonLensError;
use docx_rs::{read_docx, DocumentChild, ParagraphChild, RunChild};
use tracing::debug;

/// The two accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Guess the kind from a filename extension, case-insensitive.
    pub fn from_extension(name: &str) -> Option<Self> {
        let ext = name.rsplit('.').next()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            _ => None,
        }
    }
}

/// Identify the document format from its leading bytes, falling back to the
/// filename hint when the magic is inconclusive.
pub fn sniff_kind(bytes: &[u8], name_hint: Option<&str>) -> Result<DocumentKind, LessonLensError> {
    if bytes.starts_with(b"%PDF") {
        return Ok(DocumentKind::Pdf);
    }
    // .docx is a zip package; PK\x03\x04 is the local-file header.
    if bytes.starts_with(b"PK\x03\x04") {
        return Ok(DocumentKind::Docx);
    }
    if let Some(kind) = name_hint.and_then(DocumentKind::from_extension) {
        return Ok(kind);
    }
    Err(LessonLensError::UnsupportedFormat {
        hint: name_hint.unwrap_or("<memory buffer>").to_string(),
    })
}

/// Extract the plain text of a document.
///
/// Returns [`LessonLensError::EmptyDocument`] when extraction succeeds but
/// yields nothing to assess (e.g. a scanned PDF with no text layer).
pub fn extract_text(bytes: &[u8], kind: DocumentKind) -> Result<String, LessonLensError> {
    let text = match kind {
        DocumentKind::Pdf => extract_pdf(bytes)?,
        DocumentKind::Docx => extract_docx(bytes)?,
    };
    if text.trim().is_empty() {
        return Err(LessonLensError::EmptyDocument);
    }
    debug!("Extracted {} chars from {:?}", text.len(), kind);
    Ok(text)
}

/// Pull the text layer of every PDF page, joined with newlines.
///
/// `pdf-extract` separates pages with form feeds; we re-join on `\n` so the
/// prompt sees one continuous document.
fn extract_pdf(bytes: &[u8]) -> Result<String, LessonLensError> {
    let raw = pdf_extract::extract_text_from_mem(bytes).map_err(|e| LessonLensError::PdfRead {
        detail: format!("{e:?}"),
    })?;

    let pages: Vec<&str> = raw.split('\x0c').map(str::trim_end).collect();
    Ok(pages.join("\n"))
}

/// Pull every paragraph's run text out of a .docx package, joined with
/// newlines. Tables, headers, and drawings are skipped.
fn extract_docx(bytes: &[u8]) -> Result<String, LessonLensError> {
    let docx = read_docx(bytes).map_err(|e| LessonLensError::DocxRead {
        detail: format!("{e:?}"),
    })?;

    let mut lines = Vec::new();
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(para) = child {
            let mut line = String::new();
            for pc in &para.children {
                if let ParagraphChild::Run(run) = pc {
                    for rc in &run.children {
                        if let RunChild::Text(t) = rc {
                            line.push_str(&t.text);
                        }
                    }
                }
            }
            lines.push(line);
        }
    }
    Ok(lines.join("\n"))
}
