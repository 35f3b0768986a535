//! Fixed instruction text and output schema for analysis requests.
//!
//! The prompt and schema are sent unchanged with every analysis request and
//! are the only thing that keeps the model's answer parseable. Changing the
//! schema means changing [`crate::models::analysis::AnalysisResult`] too.

use serde_json::{Value, json};

/// Rubric and output rules for the analysis model.
pub const SYSTEM_PROMPT: &str = "\
You are a clinical communications analyst. You analyze patient transcripts to \
assess the level of emotional distress a patient expresses after receiving a new \
health diagnosis (for example diabetes). Be objective and empathetic, and follow \
these rules exactly.

Rules:

1. Analyze the patient transcript you are given.
2. Respond only by calling the provided tool with a single JSON object that \
conforms to its schema.
3. Never provide a medical diagnosis, a treatment plan, or medication advice. \
Recommendations must be supportive, behavioral and non-clinical.
4. Evidence must be exact quotes from the patient. Do not paraphrase and do not \
infer beyond the text.
5. Keep every generated sentence supportive and non-accusatory, especially the \
high-level explanation.

Distress classification rubric:

- none (score 0.00-0.15): calm, focused on logistics, asks practical questions, \
no significant emotional language.
  Keywords: \"plan\", \"next steps\", \"schedule\", \"okay\".
  Example: \"Okay, so what's the next step for my diet?\"
- low (score 0.16-0.40): some worry or uncertainty, but generally composed and \
solution-oriented.
  Keywords: \"a bit worried\", \"nervous\", \"I guess\", \"confusing\".
  Example: \"I'm a bit worried about giving myself shots, but I guess I'll learn.\"
- medium (score 0.41-0.75): repeated fear, helplessness or rumination; may \
mention effects on sleep, appetite or daily life.
  Keywords: \"scared\", \"can't handle this\", \"overwhelmed\", \"not sleeping\".
  Example: \"I just feel so overwhelmed. I keep thinking about it and I haven't \
been sleeping well.\"
- high (score 0.76-1.00): catastrophic fears, inability to cope, significant \
physiological stress symptoms, or language that would alarm a clinician.
  Keywords: \"terrified\", \"hopeless\", \"ruined\", \"can't do this\", \
\"losing my sight\", \"my life is over\".
  Example: \"I'm terrified. I feel like my life is over and I can't do this. \
I'm going to go blind.\"

The score must fall inside the band of the chosen level.

Safety flag:

- Set safety_flag to true for any explicit or strongly implied statement of \
self-harm, suicidal ideation, or severe immediate crisis.
  Examples: \"I don't want to live anymore\", \"I wish I could just disappear\", \
\"There's no point.\"
- Otherwise safety_flag must be false.

QC notes:

- If the transcript has quality problems (garbled text, [unintelligible] markers, \
missing speaker labels that make it unclear who is speaking), describe them briefly \
in qc_notes. If quality is good, qc_notes must be an empty string.
";

/// System instruction for follow-up chat about a finished analysis.
pub const CHAT_SYSTEM_PROMPT: &str = "\
You are a helpful assistant. The user has provided a transcript and you have \
provided an analysis. Now, answer their follow-up questions about the analysis \
clearly and concisely.";

/// Prefix of the synthetic assistant turn that carries the analysis.
pub const ANALYSIS_TURN_LABEL: &str = "Here is my analysis of the transcript you provided:";

/// First message shown in every new conversation.
pub const WELCOME_MESSAGE: &str =
    "Welcome to the AI Distress Analysis Tool. Please paste a patient transcript to begin.";

/// Bot message appended after a successful analysis.
pub const ANALYSIS_ACK_MESSAGE: &str = "Analysis complete. You can now ask me questions about it.";

/// Name of the tool the model is forced to call with its structured answer.
pub const ANALYSIS_TOOL_NAME: &str = "record_distress_analysis";

pub const ANALYSIS_TOOL_DESCRIPTION: &str =
    "Record the distress analysis of the patient transcript.";

/// Wire names of the required output fields, in schema order.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "distress_level",
    "score",
    "explanation_high_level",
    "evidence_spans",
    "recommendations",
    "safety_flag",
    "qc_notes",
];

/// JSON Schema of the structured answer.
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "distress_level": {
                "type": "string",
                "enum": ["none", "low", "medium", "high"],
                "description": "The classified distress level."
            },
            "score": {
                "type": "number",
                "minimum": 0.0,
                "maximum": 1.0,
                "description": "A numerical score from 0.0 to 1.0 representing the distress level."
            },
            "explanation_high_level": {
                "type": "string",
                "description": "A brief, non-accusatory explanation of the classification."
            },
            "evidence_spans": {
                "type": "array",
                "description": "Direct quotes from the transcript serving as evidence.",
                "items": {
                    "type": "object",
                    "properties": {
                        "text": {
                            "type": "string",
                            "description": "The exact quote from the transcript."
                        },
                        "reason": {
                            "type": "string",
                            "description": "Why this quote is evidence for the distress level."
                        }
                    },
                    "required": ["text", "reason"]
                }
            },
            "recommendations": {
                "type": "array",
                "description": "Three short, supportive, non-diagnostic, actionable recommendations.",
                "items": { "type": "string" }
            },
            "safety_flag": {
                "type": "boolean",
                "description": "True if self-harm or crisis indicators are present."
            },
            "qc_notes": {
                "type": "string",
                "description": "Notes on the quality of the transcript (ASR issues, etc.)."
            }
        },
        "required": REQUIRED_FIELDS,
    })
}
