//! Initial message assembly for one orchestration call.
//!
//! Order is fixed: persona, tool summary (only with tools enabled),
//! background context (only when supplied), then the user's message.

use chatrelay_core::message::Message;
use chatrelay_core::tool::ToolDefinition;
use serde_json::Value;

/// Upper bound on the context block, in characters.
pub const MAX_CONTEXT_CHARS: usize = 10_000;

/// The base persona every conversation starts with.
pub const BASE_PERSONA: &str = concat!(
    "You are chatrelay, a helpful AI assistant. ",
    "Answer clearly and concisely, and say so when you are unsure. ",
    "Reply in the language the user writes in.",
);

pub fn build(user_message: &str, context: Option<&Value>, tools: &[ToolDefinition]) -> Vec<Message> {
    let mut messages = vec![Message::system(BASE_PERSONA)];

    if !tools.is_empty() {
        messages.push(Message::system(tool_summary(tools)));
    }

    if let Some(context) = context.and_then(render_context) {
        messages.push(Message::system(frame_context(&context)));
    }

    messages.push(Message::user(user_message));
    messages
}

fn tool_summary(tools: &[ToolDefinition]) -> String {
    let mut summary = String::from("<capabilities>\n");
    summary.push_str("You can call the following tools when they help answer the user:\n");
    for tool in tools {
        summary.push_str(&format!("- {}: {}\n", tool.display_name, tool.description));
    }
    summary.push_str("Call a tool only when its result is needed; otherwise answer directly.\n");
    summary.push_str("</capabilities>");
    summary
}

/// Render caller context as text. Blank strings and `null` count as absent.
fn render_context(context: &Value) -> Option<String> {
    let rendered = match context {
        Value::Null => return None,
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };

    if rendered.trim().is_empty() {
        return None;
    }

    Some(if rendered.chars().count() > MAX_CONTEXT_CHARS {
        rendered.chars().take(MAX_CONTEXT_CHARS).collect()
    } else {
        rendered
    })
}

fn frame_context(context: &str) -> String {
    format!(
        "<background>\nThe user is currently viewing or discussing the following content. \
         Use it as background when it is relevant to their message.\n\n{context}\n</background>"
    )
}
