//! distress-bedrock
//!
//! Bedrock Converse implementations of the analysis, chat and document
//! import services.

pub mod analysis;
pub mod chat;
pub mod client;
pub mod document;
pub mod error;
pub mod extract;
pub mod tokens;

pub use client::BedrockClient;
