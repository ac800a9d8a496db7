//! Report formatting: deterministic classification of generated text.
//!
//! ## Why is a cleanup pass necessary?
//!
//! Even well-prompted models decorate their answer: a courteous preamble
//! before the requested skeleton, stray annotation fragments echoed from the
//! rubric, inline `$...$` math around plain numbers, bold markers around
//! labels. This module applies cheap, deterministic string/regex rules that
//! fix those quirks without touching content, then classifies each line into
//! a [`ReportLine`]. Keeping the rules here rather than in the prompt means
//! the prompt stays focused on *what to review*, not on formatting
//! edge-cases. Each rule is independently testable.
//!
//! ## Rule Order
//!
//! Per line: trim → separator/blank skip → preamble gate → denylist removal
//! → math unwrapping → bold stripping → classification. The preamble gate
//! looks at the *raw* trimmed line so cleanup can never hide the first
//! section marker. The whole pass is idempotent: classifying the rendered
//! Markdown of a report reproduces the same report.

use crate::prompts::FIRST_SECTION_MARKER;
use crate::report::ReportLine;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Token opening a horizontal-rule line. Lines equal to or starting with it
/// are dropped before any other rule runs.
pub const SEPARATOR_TOKEN: &str = "---";

/// Annotation fragments removed from every retained line.
///
/// Configuration data, not logic: these are literal strings the model has
/// been seen echoing from the rubric or wrapping around its answer. Removal
/// is plain substring replacement.
pub const DEFAULT_ANNOTATION_DENYLIST: &[&str] = &[
    "(Markdown)",
    "[Markdown]",
    "(English)",
    "[Your assessment here]",
    "(nếu có)",
];

/// Options for the classification pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatterOptions {
    /// Literal fragments stripped from every retained line.
    pub denylist: Vec<String>,
}

impl Default for FormatterOptions {
    fn default() -> Self {
        Self {
            denylist: DEFAULT_ANNOTATION_DENYLIST
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }
}

/// Classify raw generated text into report lines.
///
/// Everything before the first line starting with [`FIRST_SECTION_MARKER`]
/// is preamble and is discarded — even if it is itself a heading. Lines
/// whose content is empty after cleanup are silently omitted, never emitted
/// as empty paragraphs or bullets.
pub fn classify_report(raw: &str, options: &FormatterOptions) -> Vec<ReportLine> {
    let mut lines = Vec::new();
    let mut in_report = false;

    for raw_line in raw.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with(SEPARATOR_TOKEN) {
            continue;
        }
        if !in_report {
            if line.starts_with(FIRST_SECTION_MARKER) {
                in_report = true;
            } else {
                continue;
            }
        }
        let cleaned = clean_line(line, options);
        if let Some(report_line) = classify_line(&cleaned) {
            lines.push(report_line);
        }
    }

    lines
}

/// Apply the per-line cleanup rules: denylist, math delimiters, bold markers.
fn clean_line(line: &str, options: &FormatterOptions) -> String {
    let mut s = line.to_string();
    for fragment in &options.denylist {
        if !fragment.is_empty() {
            s = s.replace(fragment.as_str(), "");
        }
    }
    s = unwrap_inline_math(&s);
    s = s.replace("**", "");
    s.trim().to_string()
}

// Well-formed `$...$` pairs only: at least one non-`$` character between the
// delimiters, no crossing a line. Unpaired or empty delimiters stay as-is.
static RE_INLINE_MATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$([^$\n]+?)\$").unwrap());

fn unwrap_inline_math(line: &str) -> String {
    RE_INLINE_MATH.replace_all(line, "$1").to_string()
}

/// Map a cleaned line to its report class, or `None` when nothing is left.
fn classify_line(line: &str) -> Option<ReportLine> {
    if line.is_empty() {
        return None;
    }
    if let Some(rest) = line.strip_prefix("### ") {
        let text = rest.trim();
        return (!text.is_empty()).then(|| ReportLine::Heading2(text.to_string()));
    }
    if let Some(rest) = line.strip_prefix("## ") {
        let text = rest.trim();
        return (!text.is_empty()).then(|| ReportLine::Heading1(text.to_string()));
    }
    if let Some(rest) = line.strip_prefix("* ").or_else(|| line.strip_prefix("- ")) {
        let text = rest.trim();
        return (!text.is_empty()).then(|| ReportLine::Bullet(text.to_string()));
    }
    // A bare marker is an empty heading or bullet, not a paragraph.
    if matches!(line, "*" | "-" | "##" | "###") {
        return None;
    }
    Some(ReportLine::Paragraph(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(raw: &str) -> Vec<ReportLine> {
        classify_report(raw, &FormatterOptions::default())
    }

    #[test]
    fn heading_markers_classify_by_level() {
        let lines = classify("## 1. Tổng quan\n### Chi tiết\nđoạn văn");
        assert_eq!(
            lines,
            vec![
                ReportLine::Heading1("1. Tổng quan".into()),
                ReportLine::Heading2("Chi tiết".into()),
                ReportLine::Paragraph("đoạn văn".into()),
            ]
        );
    }

    #[test]
    fn heading_after_start_keeps_its_title() {
        let lines = classify("## 1. Mở đầu\n## Section");
        assert_eq!(lines[1], ReportLine::Heading1("Section".into()));
    }

    #[test]
    fn bullets_strip_their_marker() {
        let lines = classify("## 1. A\n* item\n- dash item");
        assert_eq!(lines[1], ReportLine::Bullet("item".into()));
        assert_eq!(lines[2], ReportLine::Bullet("dash item".into()));
    }

    #[test]
    fn empty_bullet_yields_nothing() {
        let lines = classify("## 1. A\n* \n*\n- ");
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn inline_math_is_unwrapped() {
        let lines = classify("## 1. A\nValue is $x$");
        assert_eq!(lines[1], ReportLine::Paragraph("Value is x".into()));
    }

    #[test]
    fn malformed_math_is_left_untouched() {
        let lines = classify("## 1. A\nCost is $5\nodd $a$ then $b");
        assert_eq!(lines[1], ReportLine::Paragraph("Cost is $5".into()));
        assert_eq!(lines[2], ReportLine::Paragraph("odd a then $b".into()));
    }

    #[test]
    fn empty_math_pair_is_not_a_pair() {
        assert_eq!(unwrap_inline_math("a $$ b"), "a $$ b");
    }

    #[test]
    fn preamble_is_dropped_even_when_it_has_headings() {
        let raw = "Chào bạn!\n## Giới thiệu\nmột đoạn\n## 1. Tổng quan\n* ok";
        let lines = classify(raw);
        assert_eq!(
            lines,
            vec![
                ReportLine::Heading1("1. Tổng quan".into()),
                ReportLine::Bullet("ok".into()),
            ]
        );
    }

    #[test]
    fn no_marker_means_empty_report() {
        assert!(classify("just prose\nmore prose").is_empty());
    }

    #[test]
    fn separator_lines_are_skipped() {
        let lines = classify("## 1. A\n---\n-----\nsau vạch");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], ReportLine::Paragraph("sau vạch".into()));
    }

    #[test]
    fn bold_markers_are_stripped() {
        let lines = classify("## 1. A\n* **Mục tiêu:** rõ ràng");
        assert_eq!(lines[1], ReportLine::Bullet("Mục tiêu: rõ ràng".into()));
    }

    #[test]
    fn denylist_fragments_are_removed_anywhere_in_the_line() {
        let lines = classify("## 1. A (Markdown)\n* đánh giá CNTT (nếu có) tốt");
        assert_eq!(lines[0], ReportLine::Heading1("1. A".into()));
        assert_eq!(lines[1], ReportLine::Bullet("đánh giá CNTT  tốt".into()));
    }

    #[test]
    fn line_reduced_to_nothing_by_cleanup_is_omitted() {
        let lines = classify("## 1. A\n(Markdown)\n**");
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn custom_denylist_replaces_the_default() {
        let options = FormatterOptions {
            denylist: vec!["[todo]".into()],
        };
        let lines = classify_report("## 1. A\nghi chú [todo] đây", &options);
        assert_eq!(lines[1], ReportLine::Paragraph("ghi chú  đây".into()));
    }
}
