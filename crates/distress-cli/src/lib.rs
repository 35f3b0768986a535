//! distress-cli library root.
//!
//! Exposes the argument, config, report and chat-loop modules so the
//! binary stays thin and integration tests can drive the loop with fake
//! model services.

pub mod cli;
pub mod config;
pub mod report;
pub mod repl;
