//! Response sanitizing: flatten provider content into plain text and strip
//! inline reasoning traces.
//!
//! Some providers (DeepSeek-R1, QwQ and friends) emit their chain of thought
//! inline as `<think>...</think>` before the answer. Callers only ever see
//! the answer.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::message::MessageContent;

static REASONING_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<think>.*?</think>|<thinking>.*?</thinking>").expect("valid regex")
});

/// Flatten assistant content into trimmed plain text with reasoning removed.
pub fn to_plain_text(content: Option<&MessageContent>) -> String {
    match content {
        None => String::new(),
        Some(MessageContent::Text(text)) => strip_reasoning(text),
        Some(MessageContent::Parts(parts)) => {
            let joined = parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<Vec<_>>()
                .join("\n");
            strip_reasoning(joined.trim())
        }
    }
}

/// Remove every `<think>` / `<thinking>` segment and trim.
///
/// Runs to a fixpoint so that a marker reassembled by a removal is also
/// stripped, which keeps the function idempotent.
pub fn strip_reasoning(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = REASONING_BLOCK.replace_all(&current, "");
        if next == current {
            return current.trim().to_string();
        }
        current = next.into_owned();
    }
}
