//! `chatrelay config`: configuration management commands.

use anyhow::Context;
use chatrelay_config::{AppConfig, CredentialSource};
use chatrelay_providers::ModelRegistry;
use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration (credentials masked)
    Show,

    /// Print the config file path
    Path,

    /// Print a default config file
    Default,

    /// Validate the config file and check the default model's credential
    Validate,
}

pub fn run(action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => show(),
        ConfigAction::Path => {
            println!("{}", AppConfig::config_dir().join("config.toml").display());
            Ok(())
        }
        ConfigAction::Default => {
            print!("{}", AppConfig::default_toml());
            Ok(())
        }
        ConfigAction::Validate => validate(),
    }
}

fn show() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;
    let toml_str = toml::to_string_pretty(&config.redacted())?;
    println!("{toml_str}");
    Ok(())
}

fn validate() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Config is invalid")?;
    println!("Config parsed successfully");

    let registry = ModelRegistry::from_config(&config);
    let default = registry.resolve(registry.default_id());
    if config.credential_source().lookup(&default.credential_key).is_none() {
        println!(
            "warning: {} is not set; chats with {} will fail",
            default.credential_key,
            registry.default_id()
        );
    }

    let tools = chatrelay_tools::default_registry(&config.tools);
    for id in &config.tools.default_enabled {
        if tools.select_enabled(&[id]).is_empty() {
            println!("warning: tools.default_enabled names unknown tool {id:?}");
        }
    }

    println!();
    println!("  Model:          {}", registry.default_id());
    println!("  Temperature:    {}", config.temperature);
    println!("  Fetch timeout:  {}s", config.tools.fetch_timeout_secs);

    Ok(())
}
