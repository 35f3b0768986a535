use std::io::Cursor;

use docx_rs::{AlignmentType, Docx, Paragraph, Run, RunFonts, Style, StyleType};
use tracing::debug;

use crate::error::ExportError;
use crate::styles::DocumentStyles;

/// One line of report Markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block<'a> {
    Heading { level: u8, text: &'a str },
    Bullet(&'a str),
    Quote(&'a str),
    Body(&'a str),
    Blank,
}

/// Classify a line of the Markdown subset the report template emits:
/// `#`/`##`/`###` headings, `- ` bullets, `> ` quotes, everything else body.
pub fn classify(line: &str) -> Block<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Block::Blank;
    }
    for (prefix, level) in [("### ", 3), ("## ", 2), ("# ", 1)] {
        if let Some(text) = line.strip_prefix(prefix) {
            return Block::Heading { level, text };
        }
    }
    if let Some(text) = line.strip_prefix("- ") {
        Block::Bullet(text)
    } else if let Some(text) = line.strip_prefix('>') {
        Block::Quote(text.trim_start())
    } else {
        Block::Body(line)
    }
}

/// Generate a DOCX document from rendered report Markdown. Inline `**bold**`
/// is honored in bullets, quotes and body text.
pub fn generate_docx(rendered: &str, styles: &DocumentStyles) -> Result<Vec<u8>, ExportError> {
    let mut docx = Docx::new()
        .add_style(heading_style(1, styles.heading1_size))
        .add_style(heading_style(2, styles.heading2_size))
        .add_style(heading_style(3, styles.heading3_size));

    // Runs of blank template lines become a single spacer.
    let mut after_blank = true;
    for line in rendered.lines() {
        let block = classify(line);
        if block == Block::Blank {
            if !after_blank {
                docx = docx.add_paragraph(Paragraph::new());
            }
            after_blank = true;
            continue;
        }
        after_blank = false;
        docx = docx.add_paragraph(paragraph(block, styles));
    }

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| ExportError::Docx(e.to_string()))?;

    let bytes = buf.into_inner();
    debug!(bytes = bytes.len(), "docx generated");
    Ok(bytes)
}

fn heading_style(level: u8, size_pt: usize) -> Style {
    Style::new(format!("Heading{level}"), StyleType::Paragraph)
        .name(format!("heading {level}"))
        .size(size_pt * 2) // half-points
        .bold()
}

fn paragraph(block: Block<'_>, styles: &DocumentStyles) -> Paragraph {
    let para = Paragraph::new().align(AlignmentType::Left);
    match block {
        Block::Heading { level, text } => para.style(&format!("Heading{level}")).add_run(
            Run::new()
                .add_text(text)
                .fonts(RunFonts::new().ascii(&styles.heading_font)),
        ),
        Block::Bullet(text) => inline_runs(text, styles)
            .into_iter()
            .fold(para.add_run(text_run("\u{2022} ", styles)), Paragraph::add_run),
        Block::Quote(text) => inline_runs(text, styles)
            .into_iter()
            .map(|run| run.italic().color(&styles.quote_color))
            .fold(para, Paragraph::add_run),
        Block::Body(text) => inline_runs(text, styles)
            .into_iter()
            .fold(para, Paragraph::add_run),
        Block::Blank => para,
    }
}

fn text_run(text: &str, styles: &DocumentStyles) -> Run {
    Run::new()
        .add_text(text)
        .size(styles.body_size * 2)
        .fonts(RunFonts::new().ascii(&styles.body_font))
}

/// Split `text` on `**` markers into alternating plain and bold runs. An
/// unmatched marker is kept as literal text.
fn inline_runs(text: &str, styles: &DocumentStyles) -> Vec<Run> {
    let segments: Vec<&str> = text.split("**").collect();
    let balanced = segments.len() % 2 == 1;

    let mut runs = Vec::new();
    for (i, segment) in segments.iter().enumerate() {
        let last = i + 1 == segments.len();
        let literal = if !balanced && last && i > 0 {
            format!("**{segment}")
        } else {
            segment.to_string()
        };
        if literal.is_empty() {
            continue;
        }
        let run = text_run(&literal, styles);
        let bold = i % 2 == 1 && (balanced || !last);
        runs.push(if bold { run.bold() } else { run });
    }
    runs
}
