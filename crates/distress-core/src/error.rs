use thiserror::Error;

/// Failure of a call to the external model service.
///
/// The variants are kept distinct because the front end reports the raw
/// message to the user and needs to tell a missing credential apart from a
/// network failure or a malformed answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("model client is not configured: {0}")]
    Config(String),

    #[error("model request failed: {0}")]
    Transport(String),

    #[error("model response did not match the analysis schema: {0}")]
    Parse(String),

    #[error("chat context is not usable: {0}")]
    InvalidContext(String),

    #[error("analysis violates the classification rubric: {0}")]
    Contract(String),
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::Parse(e.to_string())
    }
}
