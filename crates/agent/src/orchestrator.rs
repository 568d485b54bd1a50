//! The conversation orchestrator.
//!
//! One call to [`Orchestrator::chat`] runs a bounded loop:
//!
//! 1. **Connect** to the provider for the resolved model (credential first)
//! 2. **Complete** with the accumulated messages and the enabled tool schema
//! 3. **If tool calls**: run them, append one tool message per call, go to 2
//! 4. **If text**: sanitize it and return it as the answer
//!
//! The loop stops after [`MAX_TOOL_ITERATIONS`] completions even if the model
//! keeps asking for tools. Tool failures are reported back to the model as
//! tool messages and never end the conversation.

use std::sync::Arc;
use std::time::Instant;

use chatrelay_config::{AppConfig, CredentialSource};
use chatrelay_core::error::{ProviderError, ToolError};
use chatrelay_core::message::{Message, ToolCallRequest};
use chatrelay_core::provider::{Provider, ProviderFactory, ProviderRequest, ToolChoice};
use chatrelay_core::sanitize::to_plain_text;
use chatrelay_core::tool::{EnabledTools, ToolRegistry, to_provider_schema};
use chatrelay_providers::{ModelRegistry, OpenAiCompatFactory};
use futures::future::join_all;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::message_builder;

/// Completion round-trips allowed per call when tools are enabled.
pub const MAX_TOOL_ITERATIONS: usize = 5;

/// One caller request.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// The user's message
    pub message: String,

    /// Background the user is viewing or discussing (string or JSON)
    pub context: Option<Value>,

    /// Ids of the tools to enable
    pub tools: Vec<String>,

    /// Model id; the registry default when `None` or unknown
    pub model: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// How a conversation ended.
///
/// Every variant renders to text with [`ChatOutcome::into_text`], so callers
/// that only want a string can ignore the distinction.
#[derive(Debug, Clone)]
pub enum ChatOutcome {
    /// Sanitized final answer from the model
    Answer(String),

    /// Detected before any network call, e.g. a missing credential
    ConfigurationError(String),

    /// The provider call failed; not retried
    ProviderFailure(ProviderError),

    /// The model was still requesting tools after the last allowed completion
    IterationLimitExceeded,
}

impl ChatOutcome {
    pub fn is_answer(&self) -> bool {
        matches!(self, Self::Answer(_))
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Answer(text) => text,
            Self::ConfigurationError(message) => {
                chatrelay_core::Error::Config { message }.to_string()
            }
            Self::ProviderFailure(e) => chatrelay_core::Error::Provider(e).to_string(),
            Self::IterationLimitExceeded => iteration_limit_text(),
        }
    }
}

fn iteration_limit_text() -> String {
    format!(
        "Tool-call iteration limit exceeded: the model was still requesting tools after \
         {MAX_TOOL_ITERATIONS} rounds. Try rephrasing the request or enabling fewer tools."
    )
}

/// Where the tool loop is.
enum Phase {
    AwaitingCompletion,
    DispatchingTools(Vec<ToolCallRequest>),
    Finished(ChatOutcome),
}

/// Drives one conversation per [`chat`](Self::chat) call.
///
/// Holds only immutable shared state, so one instance serves concurrent
/// calls.
#[derive(Clone)]
pub struct Orchestrator {
    models: Arc<ModelRegistry>,
    tools: Arc<ToolRegistry>,
    credentials: Arc<dyn CredentialSource>,
    factory: Arc<dyn ProviderFactory>,
    temperature: f32,
}

impl Orchestrator {
    pub fn new(
        models: Arc<ModelRegistry>,
        tools: Arc<ToolRegistry>,
        credentials: Arc<dyn CredentialSource>,
        factory: Arc<dyn ProviderFactory>,
    ) -> Self {
        Self {
            models,
            tools,
            credentials,
            factory,
            temperature: 0.7,
        }
    }

    /// Production wiring: configured models and credentials, built-in tools
    /// and the OpenAI-compatible client.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(ModelRegistry::from_config(config)),
            Arc::new(chatrelay_tools::default_registry(&config.tools)),
            Arc::new(config.credential_source()),
            Arc::new(OpenAiCompatFactory),
        )
        .with_temperature(config.temperature)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run one conversation to completion.
    pub async fn chat(&self, request: ChatRequest) -> ChatOutcome {
        let started = Instant::now();
        let model_id = request
            .model
            .as_deref()
            .unwrap_or_else(|| self.models.default_id());
        let model = self.models.resolve(model_id);

        let Some(api_key) = self.credentials.lookup(&model.credential_key) else {
            warn!(model = %model_id, credential = %model.credential_key, "Missing credential");
            return ChatOutcome::ConfigurationError(format!(
                "missing credential {} for model {model_id}",
                model.credential_key
            ));
        };
        let provider = self.factory.connect(model, api_key);
        let enabled = self.tools.select_enabled(&request.tools);

        info!(
            model = %model.upstream_model,
            provider = %provider.name(),
            tools = ?enabled.ids(),
            "Processing chat request"
        );

        let messages =
            message_builder::build(&request.message, request.context.as_ref(), &enabled.definitions());

        let (outcome, round_trips) = if enabled.is_empty() {
            (
                self.single_completion(provider.as_ref(), &model.upstream_model, messages)
                    .await,
                1,
            )
        } else {
            self.tool_loop(provider.as_ref(), &model.upstream_model, &enabled, messages)
                .await
        };

        info!(
            round_trips,
            answered = outcome.is_answer(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Chat request finished"
        );
        outcome
    }

    async fn single_completion(
        &self,
        provider: &dyn Provider,
        model: &str,
        messages: Vec<Message>,
    ) -> ChatOutcome {
        let request = ProviderRequest {
            model: model.to_string(),
            messages,
            temperature: self.temperature,
            tools: Vec::new(),
            tool_choice: None,
        };

        match provider.complete(request).await {
            Ok(response) => ChatOutcome::Answer(to_plain_text(response.message.assistant_content())),
            Err(e) => {
                warn!(error = %e, "Completion failed");
                ChatOutcome::ProviderFailure(e)
            }
        }
    }

    async fn tool_loop(
        &self,
        provider: &dyn Provider,
        model: &str,
        enabled: &EnabledTools,
        mut messages: Vec<Message>,
    ) -> (ChatOutcome, usize) {
        let schema = to_provider_schema(&enabled.definitions());
        let mut iterations = 0;
        let mut phase = Phase::AwaitingCompletion;

        loop {
            phase = match phase {
                Phase::AwaitingCompletion => {
                    debug!(iteration = iterations + 1, messages = messages.len(), "Requesting completion");
                    let request = ProviderRequest {
                        model: model.to_string(),
                        messages: messages.clone(),
                        temperature: self.temperature,
                        tools: schema.clone(),
                        tool_choice: Some(ToolChoice::Auto),
                    };
                    iterations += 1;

                    match provider.complete(request).await {
                        Err(e) => {
                            warn!(iteration = iterations, error = %e, "Completion failed");
                            Phase::Finished(ChatOutcome::ProviderFailure(e))
                        }
                        Ok(response) => {
                            let calls = response.message.tool_calls().to_vec();
                            let answer = to_plain_text(response.message.assistant_content());
                            messages.push(response.message);

                            if calls.is_empty() {
                                Phase::Finished(ChatOutcome::Answer(answer))
                            } else {
                                Phase::DispatchingTools(calls)
                            }
                        }
                    }
                }
                Phase::DispatchingTools(calls) => {
                    debug!(iteration = iterations, count = calls.len(), "Dispatching tool calls");
                    let results = join_all(calls.iter().map(|call| dispatch(enabled, call))).await;
                    for (call, result) in calls.iter().zip(results) {
                        messages.push(Message::tool_result(&call.id, result));
                    }

                    if iterations >= MAX_TOOL_ITERATIONS {
                        warn!(iterations, "Tool-call iteration limit reached");
                        Phase::Finished(ChatOutcome::IterationLimitExceeded)
                    } else {
                        Phase::AwaitingCompletion
                    }
                }
                Phase::Finished(outcome) => return (outcome, iterations),
            };
        }
    }
}

/// Run one tool call and render its tool-message content. Never fails:
/// every error becomes an `{"error": ...}` envelope the model can read.
async fn dispatch(enabled: &EnabledTools, call: &ToolCallRequest) -> String {
    let Some(tool) = enabled.find(&call.name) else {
        warn!(tool = %call.name, call_id = %call.id, "Model requested a tool that is not enabled");
        return error_envelope(&ToolError::NotEnabled(call.name.clone()));
    };

    let arguments: Value = match serde_json::from_str(&call.arguments) {
        Ok(arguments) => arguments,
        Err(e) => {
            warn!(tool = %call.name, call_id = %call.id, error = %e, "Malformed tool arguments");
            return json!({
                "error": format!("invalid JSON arguments: {e}"),
                "raw": call.arguments,
            })
            .to_string();
        }
    };

    let started = Instant::now();
    let result = tool.execute(arguments).await;
    let duration_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(output) => {
            debug!(tool = %call.name, call_id = %call.id, duration_ms, "Tool call succeeded");
            output
        }
        Err(e) => {
            warn!(tool = %call.name, call_id = %call.id, duration_ms, error = %e, "Tool call failed");
            error_envelope(&e)
        }
    }
}

fn error_envelope(error: &ToolError) -> String {
    json!({ "error": error.to_string() }).to_string()
}
