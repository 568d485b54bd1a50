//! Conversation orchestration for chatrelay.
//!
//! A chat request becomes an initial message sequence (see
//! [`message_builder`]) and is then driven by the [`Orchestrator`]:
//! completions interleaved with tool calls until the model answers in text
//! or the iteration ceiling is reached.

pub mod message_builder;
pub mod orchestrator;

pub use orchestrator::{ChatOutcome, ChatRequest, MAX_TOOL_ITERATIONS, Orchestrator};
