use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Ordinal classification of expressed emotional distress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistressLevel {
    None,
    Low,
    Medium,
    High,
}

impl DistressLevel {
    pub const ALL: [DistressLevel; 4] = [
        DistressLevel::None,
        DistressLevel::Low,
        DistressLevel::Medium,
        DistressLevel::High,
    ];

    /// Score band the rubric assigns to this level.
    pub fn score_band(self) -> RangeInclusive<f64> {
        match self {
            DistressLevel::None => 0.0..=0.15,
            DistressLevel::Low => 0.16..=0.40,
            DistressLevel::Medium => 0.41..=0.75,
            DistressLevel::High => 0.76..=1.0,
        }
    }

    /// Whether `score` is consistent with this level.
    ///
    /// The rubric quotes bands to two decimals, so scores falling in the gap
    /// between two bands (e.g. 0.155) are accepted by both neighbours.
    pub fn accepts_score(self, score: f64) -> bool {
        const SLACK: f64 = 0.005;
        let band = self.score_band();
        (0.0..=1.0).contains(&score)
            && score >= band.start() - SLACK
            && score <= band.end() + SLACK
    }

    /// Pull `score` into this level's band.
    pub fn clamp_score(self, score: f64) -> f64 {
        let band = self.score_band();
        score.clamp(*band.start(), *band.end())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DistressLevel::None => "none",
            DistressLevel::Low => "low",
            DistressLevel::Medium => "medium",
            DistressLevel::High => "high",
        }
    }
}

impl fmt::Display for DistressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verbatim quote from the transcript and why it supports the level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSpan {
    pub text: String,
    pub reason: String,
}

/// The structured output of one analysis request.
///
/// Field names are the wire names of the output schema in
/// [`crate::prompt::response_schema`]; all seven are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub distress_level: DistressLevel,
    pub score: f64,
    pub explanation_high_level: String,
    pub evidence_spans: Vec<EvidenceSpan>,
    pub recommendations: Vec<String>,
    pub safety_flag: bool,
    /// Empty when the transcript had no quality issues.
    pub qc_notes: String,
}

impl AnalysisResult {
    /// Parse a model payload. Any deviation from the declared shape is an
    /// error; nothing is coerced.
    pub fn from_json_str(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload.trim())
    }

    pub fn has_qc_notes(&self) -> bool {
        !self.qc_notes.trim().is_empty()
    }

    /// Score on the 0–100 scale used in reports.
    pub fn percent(&self) -> u32 {
        (self.score.clamp(0.0, 1.0) * 100.0).round() as u32
    }
}
