//! End-to-end integration tests for the chatrelay pipeline.
//!
//! These exercise the orchestrator with the real tool registry against
//! local HTTP fixtures: scripted providers for the tool-loop scenarios, and
//! the real OpenAI-compatible client for the full wire path.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chatrelay_agent::{ChatOutcome, ChatRequest, MAX_TOOL_ITERATIONS, Orchestrator};
use chatrelay_config::{AppConfig, StaticCredentials, ToolsConfig};
use chatrelay_core::error::ProviderError;
use chatrelay_core::message::{Message, ToolCallRequest};
use chatrelay_core::provider::{
    ModelConfig, Provider, ProviderFactory, ProviderRequest, ProviderResponse, Usage,
};
use chatrelay_providers::ModelRegistry;
use chatrelay_tools::default_registry;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const EXAMPLE_PAGE: &str = r#"<!doctype html>
<html>
<head><title>Example Domain</title><style>body { color: #333; }</style></head>
<body>
<div>
    <h1>Example Domain</h1>
    <p>This domain is for use in illustrative examples in documents. You may use this
    domain in literature without prior coordination or asking for permission.</p>
</div>
</body>
</html>"#;

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted responses in sequence and keeps
/// every request it saw.
struct ScriptedProvider {
    responses: Vec<Message>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<Message>) -> Arc<Self> {
        Arc::new(Self {
            responses,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len();
        requests.push(request);
        let message = self.responses.get(index).cloned().unwrap_or_else(|| {
            panic!(
                "ScriptedProvider exhausted: call #{index}, have {}",
                self.responses.len()
            )
        });
        Ok(ProviderResponse {
            message,
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock".into(),
        })
    }
}

struct FixedFactory {
    provider: Arc<dyn Provider>,
    connects: AtomicUsize,
}

impl ProviderFactory for FixedFactory {
    fn connect(&self, _model: &ModelConfig, _api_key: String) -> Arc<dyn Provider> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.provider.clone()
    }
}

fn fixed_factory(provider: Arc<dyn Provider>) -> Arc<FixedFactory> {
    Arc::new(FixedFactory {
        provider,
        connects: AtomicUsize::new(0),
    })
}

fn orchestrator(factory: Arc<FixedFactory>, credentials: StaticCredentials) -> Orchestrator {
    let tools_config = ToolsConfig {
        fetch_timeout_secs: 5,
        ..ToolsConfig::default()
    };
    Orchestrator::new(
        Arc::new(ModelRegistry::builtin()),
        Arc::new(default_registry(&tools_config)),
        Arc::new(credentials),
        factory,
    )
}

fn deepseek_key() -> StaticCredentials {
    StaticCredentials::new().with("DEEPSEEK_API_KEY", "sk-e2e")
}

fn fetch_call(id: &str, url: &str) -> Message {
    Message::assistant_with_tool_calls(
        None,
        vec![ToolCallRequest {
            id: id.into(),
            name: "fetch_web_summary".into(),
            arguments: json!({"url": url}).to_string(),
        }],
    )
}

fn tool_results(request: &ProviderRequest) -> Vec<(String, Value)> {
    request
        .messages
        .iter()
        .filter_map(|m| match m {
            Message::Tool {
                tool_call_id,
                content,
            } => Some((
                tool_call_id.clone(),
                serde_json::from_str(content).unwrap_or_else(|_| Value::String(content.clone())),
            )),
            _ => None,
        })
        .collect()
}

async fn page_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(EXAMPLE_PAGE, "text/html"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/blank"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><head><title>Blank</title></head><body> </body></html>", "text/html"),
        )
        .mount(&server)
        .await;
    server
}

// ── E2E: Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_fast_path_answers_in_one_round_trip() {
    let provider = ScriptedProvider::new(vec![Message::assistant("4")]);
    let orchestrator = orchestrator(fixed_factory(provider.clone()), deepseek_key());

    let outcome = orchestrator.chat(ChatRequest::new("what is 2+2")).await;

    assert_eq!(outcome.into_text(), "4");
    assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn e2e_fetches_page_then_answers() {
    let pages = page_server().await;
    let url = format!("{}/", pages.uri());
    let provider = ScriptedProvider::new(vec![
        fetch_call("call_1", &url),
        Message::assistant("The page is the Example Domain placeholder."),
    ]);
    let orchestrator = orchestrator(fixed_factory(provider.clone()), deepseek_key());

    let outcome = orchestrator
        .chat(ChatRequest::new("summarize this page").with_tools(["fetch_web_summary"]))
        .await;

    assert_eq!(outcome.into_text(), "The page is the Example Domain placeholder.");
    let requests = provider.requests();
    assert_eq!(requests.len(), 2);

    let results = tool_results(&requests[1]);
    assert_eq!(results.len(), 1);
    let (call_id, summary) = &results[0];
    assert_eq!(call_id, "call_1");
    assert_eq!(summary["title"], "Example Domain");
    assert_eq!(summary["url"], url);
    assert_eq!(summary["headings"], json!(["Example Domain"]));
    assert!(summary["excerpt"].as_str().unwrap().contains("illustrative examples"));
    assert!(!summary["excerpt"].as_str().unwrap().contains("color: #333"));
}

#[tokio::test]
async fn e2e_empty_page_error_then_corrected_call() {
    let pages = page_server().await;
    let provider = ScriptedProvider::new(vec![
        fetch_call("call_1", &format!("{}/blank", pages.uri())),
        fetch_call("call_2", &format!("{}/", pages.uri())),
        Message::assistant("Found it on the second try."),
    ]);
    let orchestrator = orchestrator(fixed_factory(provider.clone()), deepseek_key());

    let outcome = orchestrator
        .chat(ChatRequest::new("summarize").with_tools(["fetch_web_summary"]))
        .await;

    assert!(outcome.is_answer());
    let requests = provider.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests.len() <= MAX_TOOL_ITERATIONS);

    let results = tool_results(&requests[2]);
    assert_eq!(results.len(), 2);
    assert!(results[0].1["error"].as_str().unwrap().contains("no readable text"));
    assert_eq!(results[1].1["title"], "Example Domain");
}

#[tokio::test]
async fn e2e_disabled_tool_is_not_an_error() {
    let provider = ScriptedProvider::new(vec![
        Message::assistant_with_tool_calls(
            None,
            vec![ToolCallRequest {
                id: "call_x".into(),
                name: "run_shell".into(),
                arguments: "{}".into(),
            }],
        ),
        Message::assistant("That tool isn't available."),
    ]);
    let orchestrator = orchestrator(fixed_factory(provider.clone()), deepseek_key());

    let outcome = orchestrator
        .chat(ChatRequest::new("list files").with_tools(["fetch_web_summary"]))
        .await;

    assert_eq!(outcome.into_text(), "That tool isn't available.");
    let results = tool_results(&provider.requests()[1]);
    assert_eq!(results[0].0, "call_x");
    assert!(results[0].1["error"].as_str().unwrap().contains("not enabled"));
}

#[tokio::test]
async fn e2e_missing_credential_makes_no_network_call() {
    let provider = ScriptedProvider::new(vec![]);
    let factory = fixed_factory(provider.clone());
    let orchestrator = orchestrator(factory.clone(), StaticCredentials::new());

    let outcome = orchestrator
        .chat(ChatRequest::new("hello").with_tools(["fetch_web_summary"]))
        .await;

    assert!(matches!(outcome, ChatOutcome::ConfigurationError(_)));
    assert!(outcome.into_text().contains("DEEPSEEK_API_KEY"));
    assert_eq!(factory.connects.load(Ordering::SeqCst), 0);
    assert!(provider.requests().is_empty());
}

// ── E2E: Full wire path ──────────────────────────────────────────────────

/// Replies with the next canned completion body on each request.
struct CompletionSequence {
    bodies: Vec<Value>,
    served: AtomicUsize,
}

impl Respond for CompletionSequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.served.fetch_add(1, Ordering::SeqCst);
        match self.bodies.get(n) {
            Some(body) => ResponseTemplate::new(200).set_body_json(body),
            None => ResponseTemplate::new(500).set_body_string("sequence exhausted"),
        }
    }
}

#[tokio::test]
async fn e2e_real_client_against_compatible_endpoint() {
    let pages = page_server().await;
    let page_url = format!("{}/", pages.uri());

    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(CompletionSequence {
            bodies: vec![
                json!({
                    "model": "local-model",
                    "choices": [{"message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {
                                "name": "fetch_web_summary",
                                "arguments": json!({"url": page_url, "maxLength": 800}).to_string()
                            }
                        }]
                    }}]
                }),
                json!({
                    "model": "local-model",
                    "choices": [{"message": {
                        "role": "assistant",
                        "content": "<think>the title says it all</think>It is the Example Domain page."
                    }}]
                }),
            ],
            served: AtomicUsize::new(0),
        })
        .expect(2)
        .mount(&llm)
        .await;

    let mut config = AppConfig::default();
    config.models.insert(
        "local".into(),
        ModelConfig {
            endpoint_base: format!("{}/v1", llm.uri()),
            upstream_model: "local-model".into(),
            credential_key: "CHATRELAY_E2E_KEY".into(),
        },
    );
    config.default_model = "local".into();
    config
        .credentials
        .insert("CHATRELAY_E2E_KEY".into(), "sk-e2e".into());

    let outcome = Orchestrator::from_config(&config)
        .chat(ChatRequest::new("what is on this page?").with_tools(["fetch_web_summary"]))
        .await;
    assert_eq!(outcome.into_text(), "It is the Example Domain page.");

    // The second completion carried the tool result back to the endpoint.
    let received = llm.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    let second: Value = serde_json::from_slice(&received[1].body).unwrap();
    let tool_message = second["messages"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["role"] == "tool")
        .unwrap();
    assert_eq!(tool_message["tool_call_id"], "call_1");
    let summary: Value = serde_json::from_str(tool_message["content"].as_str().unwrap()).unwrap();
    assert_eq!(summary["title"], "Example Domain");
    assert_eq!(second["tool_choice"], "auto");
}
