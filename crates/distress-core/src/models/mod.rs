pub mod analysis;
pub mod chat_context;
pub mod message;
