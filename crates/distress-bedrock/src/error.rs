use distress_core::error::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BedrockError {
    #[error("model invocation failed: {0}")]
    Invocation(String),

    #[error("request could not be built: {0}")]
    Request(String),

    #[error("response parsing failed: {0}")]
    ResponseParse(String),

    #[error("response did not conform to expected schema: {0}")]
    SchemaViolation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("AWS config error: {0}")]
    Config(String),
}

impl From<BedrockError> for ModelError {
    fn from(e: BedrockError) -> Self {
        match e {
            BedrockError::Config(msg) => ModelError::Config(msg),
            BedrockError::Invocation(msg) | BedrockError::Request(msg) => {
                ModelError::Transport(msg)
            }
            BedrockError::ResponseParse(msg) | BedrockError::SchemaViolation(msg) => {
                ModelError::Parse(msg)
            }
            BedrockError::Serialization(e) => ModelError::Parse(e.to_string()),
        }
    }
}

/// Walk the full error chain and join all causes into one string.
///
/// AWS SDK errors often have terse `Display` impls (e.g. "dispatch failure")
/// but useful detail in the source chain.
pub fn format_err_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}
