//! # chatrelay core
//!
//! Domain types, traits, and error definitions for the chatrelay
//! conversation runtime. This crate has **no network dependencies**; it
//! defines the model every other crate implements against.
//!
//! Providers and tools are traits here. Implementations live in their
//! respective crates, so tests swap in scripted stand-ins freely.

pub mod error;
pub mod message;
pub mod provider;
pub mod sanitize;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, ToolError};
pub use message::{ContentPart, Message, MessageContent, Role, ToolCallRequest};
pub use provider::{
    ModelConfig, Provider, ProviderFactory, ProviderRequest, ProviderResponse, ProviderToolSchema,
    ToolChoice, Usage,
};
pub use sanitize::to_plain_text;
pub use tool::{
    EnabledTools, ParameterSchema, PropertySchema, Tool, ToolDefinition, ToolRegistry,
    to_provider_schema,
};
