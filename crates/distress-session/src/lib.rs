//! distress-session
//!
//! The conversation orchestrator: a two-phase state machine that routes the
//! first submission to analysis and every later one to follow-up chat, the
//! input composer that document imports append to, and the persisted
//! conversation record.

pub mod composer;
pub mod conversation;
pub mod error;
pub mod record;

pub use composer::Composer;
pub use conversation::{Orchestrator, Phase, Turn};
pub use error::SessionError;
pub use record::ConversationRecord;
