use std::fmt;
use std::path::Path;
use std::str::FromStr;

use distress_core::models::analysis::AnalysisResult;
use distress_export::docx::generate_docx;
use distress_export::error::ExportError;
use distress_export::pdf::generate_pdf;
use distress_export::render::render_report;
use distress_export::styles::DocumentStyles;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Docx,
    Markdown,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" => Ok(ExportFormat::Docx),
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            other => Err(format!("unknown export format '{other}' (expected pdf, docx or md)")),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
            ExportFormat::Markdown => "md",
        })
    }
}

/// Today's date for the report header, in the local time zone.
pub fn today() -> String {
    distress_export::report_date(&jiff::Zoned::now())
}

pub fn render(
    analysis: &AnalysisResult,
    format: ExportFormat,
    report_date: &str,
) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Pdf => generate_pdf(analysis, report_date),
        ExportFormat::Docx => {
            let markdown = render_report(analysis, report_date)?;
            generate_docx(&markdown, &DocumentStyles::default())
        }
        ExportFormat::Markdown => Ok(render_report(analysis, report_date)?.into_bytes()),
    }
}

/// Render and write the report to `path`.
pub fn write(analysis: &AnalysisResult, format: ExportFormat, path: &Path) -> eyre::Result<()> {
    let bytes = render(analysis, format, &today())?;
    std::fs::write(path, &bytes)
        .map_err(|e| eyre::eyre!("failed to write {}: {e}", path.display()))?;
    tracing::info!(path = %path.display(), %format, bytes = bytes.len(), "report exported");
    Ok(())
}
