use distress_core::error::ModelError;
use distress_core::import::ImportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("nothing to send: input is empty")]
    EmptyInput,

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("invalid conversation record: {0}")]
    InvalidRecord(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
