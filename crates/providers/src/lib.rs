//! LLM provider plumbing for chatrelay.
//!
//! - [`ModelRegistry`] maps caller-facing model ids to connection parameters.
//! - [`OpenAiCompatProvider`] talks to any OpenAI-compatible
//!   `/chat/completions` endpoint; [`OpenAiCompatFactory`] builds one per
//!   resolved model.

pub mod openai_compat;
pub mod registry;

pub use openai_compat::{OpenAiCompatFactory, OpenAiCompatProvider};
pub use registry::{DEFAULT_MODEL_ID, ModelRegistry};
