//! Configuration loading, validation, and credential lookup for chatrelay.
//!
//! Loads configuration from `~/.chatrelay/config.toml` with environment
//! variable overrides. Validates all settings at startup.

pub mod credentials;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use chatrelay_core::ModelConfig;
use serde::{Deserialize, Serialize};

pub use credentials::{ConfiguredCredentials, CredentialSource, EnvCredentials, StaticCredentials};

/// The root configuration structure.
///
/// Maps directly to `~/.chatrelay/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model id used when the caller names none (or an unknown one)
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling temperature for every completion request
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Extra or overriding model entries, keyed by model id
    #[serde(default)]
    pub models: BTreeMap<String, ModelConfig>,

    /// Inline credentials, keyed by credential name. Checked before the
    /// process environment.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub credentials: HashMap<String, String>,

    /// Tool settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_model() -> String {
    "deepseek-chat".into()
}
fn default_temperature() -> f32 {
    0.7
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let credential_names: Vec<&String> = self.credentials.keys().collect();
        f.debug_struct("AppConfig")
            .field("default_model", &self.default_model)
            .field("temperature", &self.temperature)
            .field("models", &self.models)
            .field("credentials", &format_args!("[REDACTED: {credential_names:?}]"))
            .field("tools", &self.tools)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Timeout for the web summary fetch, in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// User-Agent sent when fetching pages
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Tools enabled when the caller passes none
    #[serde(default)]
    pub default_enabled: Vec<String>,
}

fn default_fetch_timeout() -> u64 {
    15
}
fn default_user_agent() -> String {
    format!(
        "chatrelay/{} (+https://github.com/chatrelay/chatrelay)",
        env!("CARGO_PKG_VERSION")
    )
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout(),
            user_agent: default_user_agent(),
            default_enabled: vec![],
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.chatrelay/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `CHATRELAY_MODEL`
    /// - `CHATRELAY_TEMPERATURE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(model) = std::env::var("CHATRELAY_MODEL") {
            config.default_model = model;
        }

        if let Ok(raw) = std::env::var("CHATRELAY_TEMPERATURE") {
            config.temperature = raw.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "CHATRELAY_TEMPERATURE must be a number, got {raw:?}"
                ))
            })?;
            config.validate()?;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".chatrelay")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.tools.fetch_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "tools.fetch_timeout_secs must be > 0".into(),
            ));
        }

        for (id, model) in &self.models {
            if !model.endpoint_base.starts_with("http://")
                && !model.endpoint_base.starts_with("https://")
            {
                return Err(ConfigError::ValidationError(format!(
                    "models.{id}.endpoint_base must be an http(s) URL"
                )));
            }
            if model.upstream_model.is_empty() || model.credential_key.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "models.{id} needs upstream_model and credential_key"
                )));
            }
        }

        Ok(())
    }

    /// Credential lookup layered over this config: inline entries first,
    /// then the process environment.
    pub fn credential_source(&self) -> ConfiguredCredentials {
        ConfiguredCredentials::new(self.credentials.clone())
    }

    /// A copy safe to print: inline credential values are masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for secret in copy.credentials.values_mut() {
            *secret = "********".into();
        }
        copy
    }

    /// Generate a default config TOML string (for the `config` command).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            temperature: default_temperature(),
            models: BTreeMap::new(),
            credentials: HashMap::new(),
            tools: ToolsConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_model, "deepseek-chat");
        assert_eq!(config.tools.fetch_timeout_secs, 15);
        assert!(config.tools.user_agent.starts_with("chatrelay/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn redacted_masks_inline_credentials() {
        let mut config = AppConfig::default();
        config.credentials.insert("OPENAI_API_KEY".into(), "sk-live-secret".into());
        let shown = toml::to_string_pretty(&config.redacted()).unwrap();
        assert!(shown.contains("OPENAI_API_KEY"));
        assert!(!shown.contains("sk-live-secret"));
        assert_eq!(config.credentials["OPENAI_API_KEY"], "sk-live-secret");
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_model, config.default_model);
        assert_eq!(parsed.tools.user_agent, config.tools.user_agent);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_model, "deepseek-chat");
    }

    #[test]
    fn loads_models_credentials_and_tools_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
default_model = "my-local"
temperature = 0.2

[models.my-local]
endpoint_base = "http://localhost:8000/v1"
upstream_model = "qwen2.5-7b-instruct"
credential_key = "LOCAL_KEY"

[credentials]
LOCAL_KEY = "not-a-secret"

[tools]
fetch_timeout_secs = 5
default_enabled = ["fetch_web_summary"]
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.default_model, "my-local");
        assert_eq!(config.models["my-local"].upstream_model, "qwen2.5-7b-instruct");
        assert_eq!(config.tools.fetch_timeout_secs, 5);
        assert_eq!(config.tools.default_enabled, ["fetch_web_summary"]);
        assert_eq!(
            config.credential_source().lookup("LOCAL_KEY").as_deref(),
            Some("not-a-secret")
        );
    }

    #[test]
    fn non_http_model_endpoint_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[models.bad]
endpoint_base = "ftp://example.com"
upstream_model = "x"
credential_key = "K"
"#
        )
        .unwrap();

        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn unparsable_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "temperature = [").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn debug_output_redacts_credentials() {
        let mut config = AppConfig::default();
        config
            .credentials
            .insert("DEEPSEEK_API_KEY".into(), "sk-very-secret".into());
        let debug = format!("{config:?}");
        assert!(debug.contains("DEEPSEEK_API_KEY"));
        assert!(!debug.contains("sk-very-secret"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("deepseek-chat"));
        assert!(toml_str.contains("fetch_timeout_secs"));
    }
}
