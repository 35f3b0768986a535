use tera::{Context, Tera};

use distress_core::models::analysis::AnalysisResult;

use crate::error::ExportError;

/// Text shown under the safety banner in every report format.
pub const SAFETY_NOTICE: &str =
    "Crisis or self-harm risk cues detected. Please follow appropriate safety protocols.";

/// Built-in report layout in the Markdown subset understood by
/// [`crate::docx::generate_docx`].
pub const REPORT_TEMPLATE: &str = r#"# Distress Analysis Report

{{ report_date }}
{% if safety_flag %}
> **SAFETY FLAG RAISED**
> {{ safety_notice }}
{% endif %}
## Analysis Summary

**{{ distress_level | upper }}** Score: {{ percent }} / 100

> {{ explanation_quote }}

## Evidence from Transcript
{% if evidence_spans | length == 0 %}
No evidence spans were cited.
{% else %}{% for span in evidence_spans %}
- **"{{ span.text }}"** - {{ span.reason }}
{%- endfor %}
{% endif %}
## Supportive Recommendations
{% for rec in recommendations %}
- {{ rec }}
{%- endfor %}
{% if has_qc_notes %}
## Quality Notes

{{ qc_notes | trim }}
{% endif %}"#;

/// Render a Tera template with an analysis.
///
/// The analysis fields become template variables, alongside `report_date`,
/// `percent` (the score on a 0-100 scale), `safety_notice`, `has_qc_notes`
/// and `explanation_quote` (the explanation in quotes with every line
/// prefixed by `> `, so it stays one Markdown quote).
pub fn render_template(
    template_name: &str,
    template_content: &str,
    analysis: &AnalysisResult,
    report_date: &str,
) -> Result<String, ExportError> {
    let mut tera = Tera::default();
    tera.add_raw_template(template_name, template_content)
        .map_err(|e| ExportError::TemplateParse(e.to_string()))?;

    let value = serde_json::to_value(analysis)?;
    let mut context =
        Context::from_value(value).map_err(|e| ExportError::TemplateRender(e.to_string()))?;
    context.insert("report_date", report_date);
    context.insert("percent", &analysis.percent());
    context.insert("safety_notice", SAFETY_NOTICE);
    context.insert("has_qc_notes", &analysis.has_qc_notes());
    context.insert("explanation_quote", &quote_lines(&analysis.explanation_high_level));

    let rendered = tera.render(template_name, &context)?;
    Ok(rendered)
}

/// Wrap `text` in double quotes and continue each following line with `> `.
/// Blank lines are dropped since they would end the quote.
fn quote_lines(text: &str) -> String {
    let body = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n> ");
    format!("\"{body}\"")
}

/// Render the built-in report.
pub fn render_report(analysis: &AnalysisResult, report_date: &str) -> Result<String, ExportError> {
    render_template("report.md", REPORT_TEMPLATE, analysis, report_date)
}
