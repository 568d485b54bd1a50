//! Built-in tool implementations for chatrelay.
//!
//! Tools give the model a way to reach outside the conversation. Only
//! `fetch_web_summary` ships today; every tool is registered once at
//! startup and enabled per request.

pub mod html;
pub mod web_summary;

use std::sync::Arc;

use chatrelay_config::ToolsConfig;
use chatrelay_core::tool::ToolRegistry;

pub use web_summary::WebSummaryTool;

/// Create the registry holding every built-in tool.
pub fn default_registry(config: &ToolsConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WebSummaryTool::from_config(config)));
    registry
}
