//! Model registry: maps a caller-facing model id to connection parameters.
//!
//! Built once at startup from the built-in table plus any `[models.<id>]`
//! entries in the config, then shared read-only. Resolution never fails:
//! unknown ids fall back to the default model.

use std::collections::BTreeMap;

use chatrelay_config::AppConfig;
use chatrelay_core::ModelConfig;
use tracing::{debug, warn};

/// The model used when the caller names none and the config does not
/// choose a known one.
pub const DEFAULT_MODEL_ID: &str = "deepseek-chat";

/// (id, endpoint base, upstream model, credential key)
const BUILTIN_MODELS: &[(&str, &str, &str, &str)] = &[
    ("deepseek-chat", "https://api.deepseek.com/v1", "deepseek-chat", "DEEPSEEK_API_KEY"),
    ("deepseek-reasoner", "https://api.deepseek.com/v1", "deepseek-reasoner", "DEEPSEEK_API_KEY"),
    ("gpt-4o", "https://api.openai.com/v1", "gpt-4o", "OPENAI_API_KEY"),
    ("gpt-4o-mini", "https://api.openai.com/v1", "gpt-4o-mini", "OPENAI_API_KEY"),
    ("qwen-plus", "https://dashscope.aliyuncs.com/compatible-mode/v1", "qwen-plus", "DASHSCOPE_API_KEY"),
    ("moonshot-v1-8k", "https://api.moonshot.cn/v1", "moonshot-v1-8k", "MOONSHOT_API_KEY"),
    ("openrouter/auto", "https://openrouter.ai/api/v1", "openrouter/auto", "OPENROUTER_API_KEY"),
    // Ollama ignores the key, but any non-empty value must still be set.
    ("ollama/llama3.1", "http://localhost:11434/v1", "llama3.1", "OLLAMA_API_KEY"),
];

/// Immutable model id → [`ModelConfig`] table with a designated default.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: BTreeMap<String, ModelConfig>,
    default_id: String,
    default: ModelConfig,
}

impl ModelRegistry {
    /// The built-in table with [`DEFAULT_MODEL_ID`] as fallback.
    pub fn builtin() -> Self {
        Self::with_models(builtin_models(), DEFAULT_MODEL_ID)
    }

    /// Built-ins overlaid with config entries; `default_model` becomes the
    /// fallback when it names a known model.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut models = builtin_models();
        for (id, model) in &config.models {
            debug!(model_id = %id, endpoint = %model.endpoint_base, "Registering configured model");
            models.insert(id.clone(), model.clone());
        }

        let default_id = if models.contains_key(&config.default_model) {
            config.default_model.as_str()
        } else {
            warn!(
                model_id = %config.default_model,
                fallback = DEFAULT_MODEL_ID,
                "Configured default model is unknown, using fallback"
            );
            DEFAULT_MODEL_ID
        };

        Self::with_models(models, default_id)
    }

    fn with_models(models: BTreeMap<String, ModelConfig>, default_id: &str) -> Self {
        let default = models
            .get(default_id)
            .cloned()
            .unwrap_or_else(|| builtin_entry(DEFAULT_MODEL_ID));
        Self {
            models,
            default_id: default_id.to_string(),
            default,
        }
    }

    /// Connection parameters for `model_id`, or the default's when unknown.
    pub fn resolve(&self, model_id: &str) -> &ModelConfig {
        match self.models.get(model_id) {
            Some(config) => config,
            None => {
                debug!(model_id, fallback = %self.default_id, "Unknown model id, using default");
                &self.default
            }
        }
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.models.contains_key(model_id)
    }

    /// All registered models, sorted by id.
    pub fn list(&self) -> impl Iterator<Item = (&str, &ModelConfig)> {
        self.models.iter().map(|(id, config)| (id.as_str(), config))
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_models() -> BTreeMap<String, ModelConfig> {
    BUILTIN_MODELS
        .iter()
        .map(|(id, _, _, _)| (id.to_string(), builtin_entry(id)))
        .collect()
}

fn builtin_entry(id: &str) -> ModelConfig {
    let (_, endpoint, upstream, key) = BUILTIN_MODELS
        .iter()
        .find(|(candidate, _, _, _)| *candidate == id)
        .unwrap_or(&BUILTIN_MODELS[0]);
    ModelConfig {
        endpoint_base: endpoint.to_string(),
        upstream_model: upstream.to_string(),
        credential_key: key.to_string(),
    }
}
