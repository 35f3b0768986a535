//! Checks of a model answer against the classification rubric.
//!
//! The analysis client trusts any payload that parses. These checks cover
//! what the schema cannot express: score/level consistency, evidence being
//! present and verbatim, and the expected number of recommendations.
//! [`ValidatingGenerator`] applies them to any [`StructuredGenerator`]
//! according to a [`ValidationPolicy`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ModelError;
use crate::models::analysis::{AnalysisResult, DistressLevel};
use crate::service::{BoxFuture, StructuredGenerator};

pub const EXPECTED_RECOMMENDATIONS: usize = 3;

/// A single way an analysis departs from the rubric.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    ScoreOutOfRange { score: f64 },
    ScoreOutsideBand { level: DistressLevel, score: f64 },
    MissingEvidence { level: DistressLevel },
    EvidenceNotVerbatim { index: usize, text: String },
    RecommendationCount { count: usize },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::ScoreOutOfRange { score } => {
                write!(f, "score {score} is outside 0.0-1.0")
            }
            ValidationIssue::ScoreOutsideBand { level, score } => {
                let band = level.score_band();
                write!(
                    f,
                    "score {score} is outside the {level} band {:.2}-{:.2}",
                    band.start(),
                    band.end()
                )
            }
            ValidationIssue::MissingEvidence { level } => {
                write!(f, "no evidence spans for level {level}")
            }
            ValidationIssue::EvidenceNotVerbatim { index, text } => {
                write!(f, "evidence span {index} is not a verbatim quote: \"{text}\"")
            }
            ValidationIssue::RecommendationCount { count } => write!(
                f,
                "expected {EXPECTED_RECOMMENDATIONS} recommendations, got {count}"
            ),
        }
    }
}

/// Check `analysis` against the rubric and the transcript it was produced from.
pub fn validate(analysis: &AnalysisResult, transcript: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let score = analysis.score;
    let level = analysis.distress_level;

    if !(0.0..=1.0).contains(&score) {
        issues.push(ValidationIssue::ScoreOutOfRange { score });
    } else if !level.accepts_score(score) {
        issues.push(ValidationIssue::ScoreOutsideBand { level, score });
    }

    if level != DistressLevel::None && analysis.evidence_spans.is_empty() {
        issues.push(ValidationIssue::MissingEvidence { level });
    }

    let haystack = normalize(transcript);
    for (index, span) in analysis.evidence_spans.iter().enumerate() {
        let quote = normalize(span.text.trim_matches(['"', '\u{201c}', '\u{201d}']));
        if quote.is_empty() || !haystack.contains(&quote) {
            issues.push(ValidationIssue::EvidenceNotVerbatim {
                index,
                text: span.text.clone(),
            });
        }
    }

    if analysis.recommendations.len() != EXPECTED_RECOMMENDATIONS {
        issues.push(ValidationIssue::RecommendationCount {
            count: analysis.recommendations.len(),
        });
    }

    issues
}

/// Collapse whitespace runs, lowercase, and fold typographic quotes so that
/// line wrapping or smart punctuation in the model's quote does not count
/// as a paraphrase.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .map(|c| match c {
                    '\u{2018}' | '\u{2019}' => '\'',
                    '\u{201c}' | '\u{201d}' => '"',
                    other => other,
                })
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// What to do with an analysis that fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Return the model's answer as-is, without checking.
    Trust,
    /// Log each issue and return the answer unchanged.
    #[default]
    Warn,
    /// Fail the request with [`ModelError::Contract`].
    Reject,
    /// Clamp the score into the level's band, then warn about the rest.
    Repair,
}

impl FromStr for ValidationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trust" => Ok(ValidationPolicy::Trust),
            "warn" => Ok(ValidationPolicy::Warn),
            "reject" => Ok(ValidationPolicy::Reject),
            "repair" => Ok(ValidationPolicy::Repair),
            other => Err(format!(
                "unknown validation policy '{other}' (expected trust, warn, reject or repair)"
            )),
        }
    }
}

impl fmt::Display for ValidationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationPolicy::Trust => "trust",
            ValidationPolicy::Warn => "warn",
            ValidationPolicy::Reject => "reject",
            ValidationPolicy::Repair => "repair",
        };
        f.write_str(name)
    }
}

/// Apply `policy` to an analysis already returned by the model.
pub fn enforce(
    policy: ValidationPolicy,
    mut analysis: AnalysisResult,
    transcript: &str,
) -> Result<AnalysisResult, ModelError> {
    if policy == ValidationPolicy::Trust {
        return Ok(analysis);
    }

    if policy == ValidationPolicy::Repair {
        let repaired = analysis.distress_level.clamp_score(analysis.score);
        if repaired != analysis.score && !analysis.score.is_nan() {
            warn!(
                level = %analysis.distress_level,
                from = analysis.score,
                to = repaired,
                "clamped analysis score into level band"
            );
            analysis.score = repaired;
        }
    }

    let issues = validate(&analysis, transcript);
    if issues.is_empty() {
        return Ok(analysis);
    }

    if policy == ValidationPolicy::Reject {
        let joined = issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ModelError::Contract(joined));
    }

    for issue in &issues {
        warn!(%issue, "analysis failed rubric check");
    }
    Ok(analysis)
}

/// Wraps a generator and applies a [`ValidationPolicy`] to its answers.
pub struct ValidatingGenerator<G> {
    inner: G,
    policy: ValidationPolicy,
}

impl<G> ValidatingGenerator<G> {
    pub fn new(inner: G, policy: ValidationPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }
}

impl<G: StructuredGenerator> StructuredGenerator for ValidatingGenerator<G> {
    fn analyze<'a>(
        &'a self,
        transcript: &'a str,
    ) -> BoxFuture<'a, Result<AnalysisResult, ModelError>> {
        Box::pin(async move {
            let analysis = self.inner.analyze(transcript).await?;
            enforce(self.policy, analysis, transcript)
        })
    }
}
