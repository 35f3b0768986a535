//! distress-core
//!
//! Pure domain types for transcript distress analysis: the analysis result
//! shape, the prompt and output schema sent to the model, chat-context
//! seeding, and the service traits the model backends implement.
//! No AWS SDK dependency.

pub mod error;
pub mod import;
pub mod models;
pub mod prompt;
pub mod service;
pub mod validate;
