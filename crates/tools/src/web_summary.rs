//! `fetch_web_summary`: fetch a web page and condense it for the model.
//!
//! The result is a JSON object with the page title, leading headings, a
//! length-bounded plain-text excerpt and a few key sentences. `maxLength`
//! is clamped so a single call can never flood the model's context.

use std::time::Duration;

use async_trait::async_trait;
use chatrelay_config::ToolsConfig;
use chatrelay_core::error::ToolError;
use chatrelay_core::tool::{ParameterSchema, PropertySchema, Tool, ToolDefinition};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::html;

pub const TOOL_ID: &str = "fetch_web_summary";

pub const DEFAULT_MAX_LENGTH: usize = 2000;
pub const MIN_MAX_LENGTH: usize = 500;
pub const MAX_MAX_LENGTH: usize = 6000;

const MAX_HEADINGS: usize = 6;
const MAX_KEY_POINTS: usize = 4;
const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', '。', '！', '？'];

/// The JSON payload returned to the model.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSummary {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub url: String,
    pub title: String,
    pub excerpt_length: usize,
    pub headings: Vec<String>,
    pub key_points: Vec<String>,
    pub excerpt: String,
    pub fetched_at: DateTime<Utc>,
}

pub struct WebSummaryTool {
    definition: ToolDefinition,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl WebSummaryTool {
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client for {TOOL_ID}");
                reqwest::Client::new()
            });

        Self {
            definition: definition(),
            client,
            timeout_secs: timeout.as_secs(),
        }
    }

    pub fn from_config(config: &ToolsConfig) -> Self {
        Self::new(
            Duration::from_secs(config.fetch_timeout_secs),
            &config.user_agent,
        )
    }

    async fn fetch(&self, url: &str) -> Result<String, ToolError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ToolError::Timeout {
                    tool_name: TOOL_ID.into(),
                    timeout_secs: self.timeout_secs,
                }
            } else {
                ToolError::FetchFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::FetchFailed {
                url: url.to_string(),
                reason: format!("HTTP {status}"),
            });
        }

        response.text().await.map_err(|e| ToolError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

fn definition() -> ToolDefinition {
    let mut max_length = PropertySchema::new(
        "integer",
        "Maximum excerpt length in characters (500-6000, default 2000)",
    );
    max_length.minimum = Some(MIN_MAX_LENGTH as i64);
    max_length.maximum = Some(MAX_MAX_LENGTH as i64);
    max_length.default = Some(serde_json::json!(DEFAULT_MAX_LENGTH));

    ToolDefinition {
        id: TOOL_ID.into(),
        display_name: "Web page summary".into(),
        description: "Fetch a web page over HTTP(S) and return its title, main headings, \
                      a plain-text excerpt and a few key sentences."
            .into(),
        parameters: ParameterSchema::object()
            .property(
                "url",
                PropertySchema::new("string", "Absolute http:// or https:// URL of the page"),
                true,
            )
            .property("maxLength", max_length, false),
    }
}

#[async_trait]
impl Tool for WebSummaryTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let url = validate_url(arguments.get("url"))?;
        let max_length = clamp_max_length(arguments.get("maxLength"));

        debug!(url = %url, max_length, "Fetching page for summary");
        let body = self.fetch(&url).await?;
        let summary = summarize(&url, &body, max_length, Utc::now())?;

        serde_json::to_string(&summary).map_err(|e| ToolError::ExecutionFailed {
            tool_name: TOOL_ID.into(),
            reason: e.to_string(),
        })
    }
}

/// Accept only non-empty absolute http(s) URLs.
pub fn validate_url(raw: Option<&serde_json::Value>) -> Result<String, ToolError> {
    let url = raw.and_then(|v| v.as_str()).unwrap_or_default().trim();
    let lower = url.to_ascii_lowercase();
    let has_scheme = ["http://", "https://"]
        .iter()
        .any(|scheme| lower.starts_with(scheme) && lower.len() > scheme.len());

    if has_scheme {
        Ok(url.to_string())
    } else {
        Err(ToolError::InvalidUrl(url.to_string()))
    }
}

/// Effective excerpt bound: numbers (or numeric strings) clamped into
/// [`MIN_MAX_LENGTH`, `MAX_MAX_LENGTH`], anything else → the default.
pub fn clamp_max_length(raw: Option<&serde_json::Value>) -> usize {
    let requested = match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match requested.filter(|n| n.is_finite()) {
        Some(n) => n.round().clamp(MIN_MAX_LENGTH as f64, MAX_MAX_LENGTH as f64) as usize,
        None => DEFAULT_MAX_LENGTH,
    }
}

/// Build the summary for an already-fetched document.
pub fn summarize(
    url: &str,
    html_body: &str,
    max_length: usize,
    fetched_at: DateTime<Utc>,
) -> Result<WebSummary, ToolError> {
    let page = html::extract(html_body);
    if page.text.is_empty() {
        return Err(ToolError::NoReadableText(url.to_string()));
    }

    let excerpt: String = page.text.chars().take(max_length).collect();
    let key_points = key_points(&excerpt);

    Ok(WebSummary {
        kind: "web_summary",
        url: url.to_string(),
        title: page.title.unwrap_or_else(|| url.to_string()),
        excerpt_length: excerpt.chars().count(),
        headings: page.headings.into_iter().take(MAX_HEADINGS).collect(),
        key_points,
        excerpt,
        fetched_at,
    })
}

/// First few sentences of the excerpt. Western and CJK terminators split
/// alike.
fn key_points(excerpt: &str) -> Vec<String> {
    excerpt
        .split(SENTENCE_TERMINATORS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(MAX_KEY_POINTS)
        .map(String::from)
        .collect()
}
