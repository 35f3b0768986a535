//! Conversational context for follow-up questions about an analysis.
//!
//! The context is seeded with two synthetic turns so the model can answer
//! questions without the analysis object being resent on every turn:
//! the original transcript as a user turn, followed by the serialized
//! analysis as an assistant turn.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::models::analysis::AnalysisResult;
use crate::prompt;

/// Role of a turn in the model-facing history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A single turn in the model-facing history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Session handle carrying the system instruction and turn history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatContext {
    system_prompt: String,
    history: Vec<ChatTurn>,
}

impl ChatContext {
    /// Seed a context from the transcript and the analysis produced for it.
    pub fn seed(transcript: &str, analysis: &AnalysisResult) -> Result<Self, ModelError> {
        let serialized = serde_json::to_string_pretty(analysis)?;
        Ok(Self {
            system_prompt: prompt::CHAT_SYSTEM_PROMPT.to_string(),
            history: vec![
                ChatTurn::user(transcript),
                ChatTurn::assistant(format!("{}\n{serialized}", prompt::ANALYSIS_TURN_LABEL)),
            ],
        })
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Number of completed follow-up exchanges after the seed.
    pub fn exchanges(&self) -> usize {
        self.history.len().saturating_sub(2) / 2
    }

    /// Check that the history can be extended with a new user turn: it must
    /// be non-empty, start with a user turn, alternate roles, and end with
    /// an assistant turn.
    pub fn ensure_ready(&self) -> Result<(), ModelError> {
        if self.history.is_empty() {
            return Err(ModelError::InvalidContext("history is empty".to_string()));
        }
        for (i, turn) in self.history.iter().enumerate() {
            let expected = if i % 2 == 0 {
                ChatRole::User
            } else {
                ChatRole::Assistant
            };
            if turn.role != expected {
                return Err(ModelError::InvalidContext(format!(
                    "turn {i} has role {:?}, expected {expected:?}",
                    turn.role
                )));
            }
        }
        if self.history.len() % 2 != 0 {
            return Err(ModelError::InvalidContext(
                "history ends with an unanswered user turn".to_string(),
            ));
        }
        Ok(())
    }

    /// Turns to send for `message`: the full history plus the new user turn.
    pub fn outgoing(&self, message: &str) -> Vec<ChatTurn> {
        let mut turns = self.history.clone();
        turns.push(ChatTurn::user(message));
        turns
    }

    /// Record a completed exchange. Only called once the reply arrived, so a
    /// failed request leaves the history untouched.
    pub fn record_exchange(&mut self, message: &str, reply: &str) {
        self.history.push(ChatTurn::user(message));
        self.history.push(ChatTurn::assistant(reply));
    }

    /// Build a context from raw parts, e.g. when restoring a saved session.
    pub fn from_parts(system_prompt: impl Into<String>, history: Vec<ChatTurn>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            history,
        }
    }
}
