//! Tool trait: the abstraction over capabilities the model may invoke.
//!
//! Tools are registered once at startup in a [`ToolRegistry`]. Each
//! invocation of the orchestrator selects the subset it enables; the model
//! only ever refers to tools by id.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::provider::{FunctionSchema, ProviderToolSchema};

/// Static description of a tool, without its executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Stable, unique id; also the function name the model calls
    pub id: String,

    /// Human-readable name used in the capability summary
    pub display_name: String,

    /// What the tool does (sent to the model)
    pub description: String,

    /// Argument schema
    pub parameters: ParameterSchema,
}

/// A JSON-schema-like description of a tool's argument object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(rename = "type")]
    pub kind: String,

    pub properties: BTreeMap<String, PropertySchema>,

    #[serde(default)]
    pub required: Vec<String>,

    #[serde(rename = "additionalProperties", default)]
    pub additional_properties: bool,
}

impl ParameterSchema {
    /// An object schema with no properties and no extra keys allowed.
    pub fn object() -> Self {
        Self {
            kind: "object".into(),
            properties: BTreeMap::new(),
            required: Vec::new(),
            additional_properties: false,
        }
    }

    /// Add a property; `required` adds it to the required list.
    pub fn property(mut self, name: &str, schema: PropertySchema, required: bool) -> Self {
        if required {
            self.required.push(name.to_string());
        }
        self.properties.insert(name.to_string(), schema);
        self
    }
}

/// Schema of a single argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub kind: String,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl PropertySchema {
    pub fn new(kind: &str, description: &str) -> Self {
        Self {
            kind: kind.to_string(),
            description: description.to_string(),
            minimum: None,
            maximum: None,
            default: None,
        }
    }
}

/// The core Tool trait.
///
/// Implementations perform the side-effecting work and return the result as
/// a string (usually serialized JSON). Errors are reported back to the model
/// in-band by the orchestrator, so their messages should say what went wrong.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The definition advertised to callers and the model.
    fn definition(&self) -> &ToolDefinition;

    /// Execute the tool with already-parsed arguments.
    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError>;

    fn id(&self) -> &str {
        &self.definition().id
    }
}

/// The catalog of every tool this process can run.
///
/// Built once at startup and shared read-only. Registration order is kept
/// so listings are deterministic.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Replaces any existing tool with the same id.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        match self.tools.iter().position(|t| t.id() == tool.id()) {
            Some(index) => {
                tracing::debug!(tool = %tool.id(), "Replacing registered tool");
                self.tools[index] = tool;
            }
            None => self.tools.push(tool),
        }
    }

    /// All definitions, executors stripped.
    pub fn list_all(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition().clone()).collect()
    }

    /// Registered tools whose id appears in `ids`.
    ///
    /// Duplicated ids select a tool once; unknown ids are ignored.
    pub fn select_enabled<S: AsRef<str>>(&self, ids: &[S]) -> EnabledTools {
        let tools = self
            .tools
            .iter()
            .filter(|t| ids.iter().any(|id| id.as_ref() == t.id()))
            .cloned()
            .collect();
        EnabledTools { tools }
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// The tools enabled for one orchestrator invocation.
#[derive(Clone, Default)]
pub struct EnabledTools {
    tools: Vec<Arc<dyn Tool>>,
}

impl EnabledTools {
    /// Look up an enabled tool by the name the model used.
    pub fn find(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.id() == name)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition().clone()).collect()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.id()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

/// Map definitions into the provider's function-calling wire shape.
pub fn to_provider_schema(definitions: &[ToolDefinition]) -> Vec<ProviderToolSchema> {
    definitions
        .iter()
        .map(|def| ProviderToolSchema {
            kind: "function".into(),
            function: FunctionSchema {
                name: def.id.clone(),
                description: def.description.clone(),
                parameters: serde_json::to_value(&def.parameters)
                    .unwrap_or_else(|_| serde_json::json!({"type": "object"})),
            },
        })
        .collect()
}
