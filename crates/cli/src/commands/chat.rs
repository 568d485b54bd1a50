//! `chatrelay chat`: send one message and print the answer.

use std::path::PathBuf;

use anyhow::Context;
use chatrelay_agent::{ChatOutcome, ChatRequest, Orchestrator};
use chatrelay_config::AppConfig;
use clap::Args;
use serde_json::Value;

#[derive(Debug, Args)]
pub struct ChatArgs {
    /// The message to send
    #[arg(short, long)]
    pub message: String,

    /// Enable a tool by id (repeatable); defaults to `tools.default_enabled`
    #[arg(short, long = "tool", value_name = "ID")]
    pub tools: Vec<String>,

    /// Background the message refers to; JSON objects and arrays are kept
    /// structured
    #[arg(long, conflicts_with = "context_file")]
    pub context: Option<String>,

    /// Read the background context from a file
    #[arg(long, value_name = "PATH")]
    pub context_file: Option<PathBuf>,

    /// Model id (see `chatrelay models`)
    #[arg(long)]
    pub model: Option<String>,
}

pub async fn run(args: ChatArgs) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;
    let request = build_request(args, &config.tools.default_enabled)?;
    tracing::debug!(model = ?request.model, tools = ?request.tools, "Built chat request");
    let orchestrator = Orchestrator::from_config(&config);

    match orchestrator.chat(request).await {
        ChatOutcome::Answer(text) => {
            println!("{text}");
            Ok(())
        }
        other => anyhow::bail!(other.into_text()),
    }
}

pub fn build_request(args: ChatArgs, default_tools: &[String]) -> anyhow::Result<ChatRequest> {
    let raw_context = match (args.context, args.context_file) {
        (Some(text), _) => Some(text),
        (None, Some(path)) => Some(
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read context file {}", path.display()))?,
        ),
        (None, None) => None,
    };

    let tools = if args.tools.is_empty() {
        default_tools.to_vec()
    } else {
        args.tools
    };

    let mut request = ChatRequest::new(args.message).with_tools(tools);
    if let Some(context) = raw_context.map(parse_context) {
        request = request.with_context(context);
    }
    if let Some(model) = args.model {
        request = request.with_model(model);
    }
    Ok(request)
}

/// Structured JSON stays structured; anything else is plain text.
fn parse_context(raw: String) -> Value {
    match serde_json::from_str::<Value>(&raw) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => value,
        _ => Value::String(raw),
    }
}
