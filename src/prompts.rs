//! The fixed pedagogy-review prompt.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the Markdown skeleton the model is asked
//!    to produce (sections `## 1` through `## 4`) is exactly what
//!    [`crate::pipeline::format`] later classifies. Changing one without the
//!    other breaks the report, so they are kept within sight of each other.
//!
//! 2. **Testability** — unit tests can inspect the built prompt without a
//!    live API call.
//!
//! The template is Vietnamese: the tool reviews Vietnamese lesson plans and
//! the model is instructed to answer in kind. Only the embedded document
//! text varies per request; the instruction block never changes.

/// Marker opening the first required output section. Everything the model
/// emits before a line starting with this prefix is preamble and is dropped
/// by the formatter.
pub const FIRST_SECTION_MARKER: &str = "## 1";

/// Build the review prompt for one extracted lesson plan.
pub fn review_prompt(lesson_plan: &str) -> String {
    format!(
        r#"Bạn là Chuyên gia Sư phạm (Sử dụng model Gemini 3 thế hệ mới).
Hãy phân tích giáo án sau đây. Yêu cầu tư duy logic sâu chuỗi, phát hiện lỗi ẩn và gợi ý sáng tạo.

NỘI DUNG GIÁO ÁN:
{lesson_plan}

YÊU CẦU OUTPUT (Markdown):

## 1. Tổng quan
* Đánh giá chất lượng: .../10
* Nhận định chung: ...

## 2. Phân tích Sâu
* **Mục tiêu:** Phân tích kỹ tính khả thi và định lượng.
* **Hoạt động:** Phân tích dòng chảy tư duy (Flow) của học sinh.
* **Công nghệ:** Đánh giá việc ứng dụng CNTT/AI trong bài (nếu có).

## 3. Các lỗi cần khắc phục ngay
* ...

## 4. Góc Sáng tạo
* Đề xuất 1 hoạt động thay thế "Wow" để gây ấn tượng mạnh cho học sinh."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_document_text() {
        let p = review_prompt("Bài 12: Quang hợp");
        assert!(p.contains("Bài 12: Quang hợp"));
    }

    #[test]
    fn prompt_requests_the_marked_skeleton() {
        let p = review_prompt("x");
        assert!(p.contains(FIRST_SECTION_MARKER));
        assert!(p.contains("## 4"));
    }
}
