//! PDF report generation.
//!
//! Rendering happens in two steps. [`layout_report`] places every line,
//! box and rule on A4 pages and returns them as plain [`DrawOp`] values,
//! measured in millimetres from the top-left corner. [`encode_pdf`] turns
//! those pages into a PDF using the standard Helvetica fonts, so no font
//! files are embedded.
//!
//! Text widths come from the Helvetica metrics below. Characters outside
//! WinAnsi are replaced with `?`.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat, dictionary};
use tracing::debug;

use distress_core::models::analysis::{AnalysisResult, DistressLevel};

use crate::error::ExportError;
use crate::render::SAFETY_NOTICE;

pub const PAGE_WIDTH: f64 = 210.0;
pub const PAGE_HEIGHT: f64 = 297.0;
pub const MARGIN: f64 = 15.0;
/// First baseline on every page.
pub const TOP: f64 = 20.0;
/// Nothing is drawn below this line.
pub const BOTTOM: f64 = PAGE_HEIGHT - MARGIN;

const CONTENT_WIDTH: f64 = PAGE_WIDTH - 2.0 * MARGIN;
const PT_PER_MM: f64 = 72.0 / 25.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub const BLACK: Color = Color(0, 0, 0);
    const MUTED: Color = Color(100, 100, 100);
    const DATE: Color = Color(150, 150, 150);
    const RULE: Color = Color(220, 220, 220);
    const ALERT_FILL: Color = Color(254, 226, 226);
    const ALERT_BORDER: Color = Color(220, 38, 38);
    const ALERT_TITLE: Color = Color(153, 27, 27);
    const ALERT_TEXT: Color = Color(185, 28, 28);
    const EVIDENCE_FILL: Color = Color(239, 246, 255);
    const EVIDENCE_QUOTE: Color = Color(30, 64, 175);
    const EVIDENCE_REASON: Color = Color(59, 130, 246);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
    Italic,
}

impl Font {
    fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Italic => "F3",
        }
    }

    fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::Italic => "Helvetica-Oblique",
        }
    }
}

/// One drawing instruction. Coordinates are millimetres from the top-left
/// corner; `y` of a text op is its baseline.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f64,
        y: f64,
        font: Font,
        size: f64,
        color: Color,
        text: String,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Color,
        stroke: Option<Color>,
    },
    Rule {
        x1: f64,
        x2: f64,
        y: f64,
        color: Color,
    },
}

impl DrawOp {
    /// Lowest point the op reaches on the page.
    pub fn bottom(&self) -> f64 {
        match self {
            DrawOp::Text { y, .. } | DrawOp::Rule { y, .. } => *y,
            DrawOp::Rect { y, height, .. } => y + height,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// All text on the page, one op per line.
    pub fn text(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Helvetica advance widths for ASCII 32..=126, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

/// Width of `text` in millimetres.
pub fn text_width(text: &str, font: Font, size: f64) -> f64 {
    let units: u32 = text
        .chars()
        .map(|c| {
            let code = c as u32;
            if (32..=126).contains(&code) {
                u32::from(HELVETICA_WIDTHS[(code - 32) as usize])
            } else {
                556
            }
        })
        .sum();
    // Bold glyphs run roughly 5% wider.
    let scale = if font == Font::Bold { 1.05 } else { 1.0 };
    f64::from(units) / 1000.0 * size * scale / PT_PER_MM
}

/// Greedy word wrap to `max_width` millimetres. Words longer than a line
/// are split between characters. Explicit newlines start a new line.
pub fn wrap_text(text: &str, font: Font, size: f64, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if text_width(&candidate, font, size) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            for c in word.chars() {
                current.push(c);
                if text_width(&current, font, size) > max_width && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::replace(&mut current, c.to_string()));
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// A line inside a filled box, with the vertical space it takes.
struct BoxLine {
    text: String,
    font: Font,
    size: f64,
    color: Color,
    advance: f64,
}

struct BoxStyle {
    fill: Color,
    stroke: Option<Color>,
    padding_top: f64,
    padding_bottom: f64,
    indent: f64,
}

struct Layout {
    pages: Vec<Page>,
    y: f64,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: TOP,
        }
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = TOP;
    }

    /// Start a new page if `height` more millimetres would cross the bottom
    /// margin. A fresh page is never broken again.
    fn ensure(&mut self, height: f64) {
        if self.y + height > BOTTOM && self.y > TOP {
            self.new_page();
        }
    }

    fn text(&mut self, x: f64, y: f64, font: Font, size: f64, color: Color, text: impl Into<String>) {
        self.push(DrawOp::Text {
            x,
            y,
            font,
            size,
            color,
            text: text.into(),
        });
    }

    fn centered(&mut self, font: Font, size: f64, color: Color, text: &str) {
        let x = ((PAGE_WIDTH - text_width(text, font, size)) / 2.0).max(MARGIN);
        self.text(x, self.y, font, size, color, text);
    }

    fn section_title(&mut self, title: &str) {
        self.ensure(20.0);
        self.text(MARGIN, self.y, Font::Bold, 14.0, Color::BLACK, title);
        self.y += 6.0;
        self.push(DrawOp::Rule {
            x1: MARGIN,
            x2: PAGE_WIDTH - MARGIN,
            y: self.y,
            color: Color::RULE,
        });
        self.y += 8.0;
    }

    /// Lines starting at the cursor, first baseline at the cursor. Breaks
    /// pages between lines when needed.
    fn paragraph(&mut self, lines: &[String], x: f64, font: Font, size: f64, color: Color, advance: f64) {
        let block = advance * lines.len() as f64;
        if block <= BOTTOM - TOP {
            self.ensure(block);
        }
        for line in lines {
            self.ensure(advance);
            self.text(x, self.y, font, size, color, line.as_str());
            self.y += advance;
        }
    }

    /// Lines on a filled background. If the lines do not fit in the space
    /// left on the page, the box is continued on the next one.
    fn boxed(&mut self, lines: Vec<BoxLine>, style: &BoxStyle) {
        let padding = style.padding_top + style.padding_bottom;
        let mut rest = lines.as_slice();

        while !rest.is_empty() {
            let total: f64 = rest.iter().map(|l| l.advance).sum();
            if self.y + padding + total > BOTTOM && self.y > TOP && total + padding <= BOTTOM - TOP {
                self.new_page();
            }

            let available = BOTTOM - self.y - padding;
            let mut used = 0.0;
            let mut count = 0;
            for line in rest {
                if used + line.advance > available && count > 0 {
                    break;
                }
                used += line.advance;
                count += 1;
            }
            if used > available && self.y > TOP {
                self.new_page();
                continue;
            }

            let (chunk, tail) = rest.split_at(count);
            let top = self.y;
            self.push(DrawOp::Rect {
                x: MARGIN,
                y: top,
                width: CONTENT_WIDTH,
                height: used + padding,
                fill: style.fill,
                stroke: style.stroke,
            });
            let mut baseline = top + style.padding_top;
            for line in chunk {
                self.text(
                    MARGIN + style.indent,
                    baseline,
                    line.font,
                    line.size,
                    line.color,
                    line.text.as_str(),
                );
                baseline += line.advance;
            }
            self.y = top + used + padding;
            rest = tail;
            if !rest.is_empty() {
                self.new_page();
            }
        }
    }

    fn finish(self) -> Vec<Page> {
        self.pages
    }
}

fn level_colors(level: DistressLevel) -> (Color, Color) {
    match level {
        DistressLevel::None => (Color(209, 250, 229), Color(21, 94, 53)),
        DistressLevel::Low => (Color(204, 251, 241), Color(13, 94, 83)),
        DistressLevel::Medium => (Color(254, 249, 195), Color(146, 64, 14)),
        DistressLevel::High => (Color(254, 226, 226), Color(153, 27, 27)),
    }
}

/// Lay out the report for `analysis` on A4 pages.
pub fn layout_report(analysis: &AnalysisResult, report_date: &str) -> Vec<Page> {
    let mut layout = Layout::new();

    layout.centered(Font::Bold, 22.0, Color::BLACK, "Distress Analysis Report");
    layout.y += 8.0;
    layout.centered(Font::Regular, 10.0, Color::DATE, report_date);
    layout.y += 15.0;

    if analysis.safety_flag {
        let mut lines = vec![BoxLine {
            text: "SAFETY FLAG RAISED".to_string(),
            font: Font::Bold,
            size: 11.0,
            color: Color::ALERT_TITLE,
            advance: 7.0,
        }];
        lines.extend(
            wrap_text(SAFETY_NOTICE, Font::Regular, 10.0, CONTENT_WIDTH - 10.0)
                .into_iter()
                .map(|text| BoxLine {
                    text,
                    font: Font::Regular,
                    size: 10.0,
                    color: Color::ALERT_TEXT,
                    advance: 4.5,
                }),
        );
        layout.boxed(
            lines,
            &BoxStyle {
                fill: Color::ALERT_FILL,
                stroke: Some(Color::ALERT_BORDER),
                padding_top: 7.0,
                padding_bottom: 3.0,
                indent: 5.0,
            },
        );
        layout.y += 10.0;
    }

    layout.section_title("Analysis Summary");
    let level = analysis.distress_level.as_str().to_uppercase();
    let badge_width = text_width(&level, Font::Bold, 11.0) + 8.0;
    let (badge_fill, badge_text) = level_colors(analysis.distress_level);
    layout.ensure(8.0);
    let top = layout.y;
    layout.push(DrawOp::Rect {
        x: MARGIN,
        y: top,
        width: badge_width,
        height: 8.0,
        fill: badge_fill,
        stroke: None,
    });
    layout.text(MARGIN + 4.0, top + 5.5, Font::Bold, 11.0, badge_text, level);
    layout.text(
        MARGIN + badge_width + 6.0,
        top + 5.5,
        Font::Regular,
        12.0,
        Color::BLACK,
        format!("Score: {} / 100", analysis.percent()),
    );
    layout.y += 15.0;

    let explanation = wrap_text(
        &format!("\"{}\"", analysis.explanation_high_level),
        Font::Italic,
        11.0,
        CONTENT_WIDTH,
    );
    layout.paragraph(&explanation, MARGIN, Font::Italic, 11.0, Color::MUTED, 5.0);
    layout.y += 5.0;

    layout.section_title("Evidence from Transcript");
    if analysis.evidence_spans.is_empty() {
        let none = vec!["No evidence spans were cited.".to_string()];
        layout.paragraph(&none, MARGIN, Font::Italic, 10.0, Color::MUTED, 5.0);
    }
    for span in &analysis.evidence_spans {
        let quote = wrap_text(&format!("\"{}\"", span.text), Font::Bold, 11.0, CONTENT_WIDTH - 10.0)
            .into_iter()
            .map(|text| BoxLine {
                text,
                font: Font::Bold,
                size: 11.0,
                color: Color::EVIDENCE_QUOTE,
                advance: 5.0,
            });
        let reason = wrap_text(&format!("- {}", span.reason), Font::Regular, 10.0, CONTENT_WIDTH - 10.0)
            .into_iter()
            .map(|text| BoxLine {
                text,
                font: Font::Regular,
                size: 10.0,
                color: Color::EVIDENCE_REASON,
                advance: 4.0,
            });
        layout.boxed(
            quote.chain(reason).collect(),
            &BoxStyle {
                fill: Color::EVIDENCE_FILL,
                stroke: None,
                padding_top: 7.0,
                padding_bottom: 5.0,
                indent: 5.0,
            },
        );
        layout.y += 5.0;
    }

    layout.y += 5.0;
    layout.section_title("Supportive Recommendations");
    for rec in &analysis.recommendations {
        let lines = wrap_text(rec, Font::Regular, 11.0, CONTENT_WIDTH - 8.0);
        let block = 5.0 * lines.len() as f64;
        if block <= BOTTOM - TOP {
            layout.ensure(block);
        }
        for (i, line) in lines.iter().enumerate() {
            layout.ensure(5.0);
            let baseline = layout.y + 4.5;
            if i == 0 {
                layout.text(MARGIN + 2.0, baseline, Font::Regular, 11.0, Color::BLACK, "\u{2022}");
            }
            layout.text(MARGIN + 6.0, baseline, Font::Regular, 11.0, Color::BLACK, line.as_str());
            layout.y += 5.0;
        }
        layout.y += 2.0;
    }

    if analysis.has_qc_notes() {
        layout.y += 5.0;
        layout.section_title("Quality Notes");
        let notes = wrap_text(&analysis.qc_notes, Font::Regular, 10.0, CONTENT_WIDTH);
        layout.paragraph(&notes, MARGIN, Font::Regular, 10.0, Color::MUTED, 4.0);
    }

    layout.finish()
}

/// Encode laid-out pages as a PDF document.
pub fn encode_pdf(pages: &[Page]) -> Result<Vec<u8>, ExportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for font in [Font::Regular, Font::Bold, Font::Italic] {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids = Vec::with_capacity(pages.len());
    for page in pages {
        let content: Content<Vec<Operation>> = Content {
            operations: page.ops.iter().flat_map(operations).collect(),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), pt(PAGE_WIDTH), pt(PAGE_HEIGHT)],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    debug!(pages = pages.len(), bytes = buf.len(), "pdf generated");
    Ok(buf)
}

/// Lay out and encode the report for `analysis`.
pub fn generate_pdf(analysis: &AnalysisResult, report_date: &str) -> Result<Vec<u8>, ExportError> {
    encode_pdf(&layout_report(analysis, report_date))
}

fn pt(mm: f64) -> Object {
    Object::Real((mm * PT_PER_MM) as f32)
}

/// PDF y axis points up from the bottom edge.
fn pt_y(mm_from_top: f64) -> Object {
    pt(PAGE_HEIGHT - mm_from_top)
}

fn rgb(color: Color) -> Vec<Object> {
    [color.0, color.1, color.2]
        .into_iter()
        .map(|c| Object::Real(f32::from(c) / 255.0))
        .collect()
}

fn operations(op: &DrawOp) -> Vec<Operation> {
    match op {
        DrawOp::Text {
            x,
            y,
            font,
            size,
            color,
            text,
        } => vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![font.resource_name().into(), Object::Real(*size as f32)],
            ),
            Operation::new("rg", rgb(*color)),
            Operation::new("Td", vec![pt(*x), pt_y(*y)]),
            Operation::new(
                "Tj",
                vec![Object::String(win_ansi(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ],
        DrawOp::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
        } => {
            let mut ops = vec![
                Operation::new("q", vec![]),
                Operation::new("rg", rgb(*fill)),
            ];
            if let Some(stroke) = stroke {
                ops.push(Operation::new("RG", rgb(*stroke)));
                ops.push(Operation::new("w", vec![pt(0.5)]));
            }
            ops.push(Operation::new(
                "re",
                vec![pt(*x), pt_y(y + height), pt(*width), pt(*height)],
            ));
            ops.push(Operation::new(if stroke.is_some() { "B" } else { "f" }, vec![]));
            ops.push(Operation::new("Q", vec![]));
            ops
        }
        DrawOp::Rule { x1, x2, y, color } => vec![
            Operation::new("q", vec![]),
            Operation::new("RG", rgb(*color)),
            Operation::new("w", vec![pt(0.2)]),
            Operation::new("m", vec![pt(*x1), pt_y(*y)]),
            Operation::new("l", vec![pt(*x2), pt_y(*y)]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ],
    }
}

/// Encode text for the standard fonts' WinAnsi encoding.
pub fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2026}' => 0x85,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}
