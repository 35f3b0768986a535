//! distress-export
//!
//! Report generation for a finished analysis: Markdown via a Tera template,
//! DOCX from that Markdown, and PDF from a page layout of its own.

pub mod docx;
pub mod error;
pub mod pdf;
pub mod render;
pub mod styles;

/// Date line printed under the report title, e.g. "October 16, 2026".
pub fn report_date(now: &jiff::Zoned) -> String {
    now.strftime("%B %-d, %Y").to_string()
}
