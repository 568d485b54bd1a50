//! `chatrelay models`: list the model table and whether each credential is set.

use anyhow::Context;
use chatrelay_config::{AppConfig, CredentialSource};
use chatrelay_providers::ModelRegistry;

pub fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;
    let registry = ModelRegistry::from_config(&config);
    let credentials = config.credential_source();

    println!("Known models (* = default)");
    println!("==========================");
    println!();
    println!("  {:<22} {:<20} {:<22} ENDPOINT", "ID", "UPSTREAM", "CREDENTIAL");
    for (id, model) in registry.list() {
        let marker = if id == registry.default_id() { "*" } else { " " };
        let key_status = if credentials.lookup(&model.credential_key).is_some() {
            model.credential_key.clone()
        } else {
            format!("{} (unset)", model.credential_key)
        };
        println!(
            "{marker} {id:<22} {:<20} {key_status:<22} {}",
            model.upstream_model, model.endpoint_base
        );
    }
    println!();
    println!("  Add or override entries under [models.<id>] in {}", config_path_hint());

    Ok(())
}

fn config_path_hint() -> String {
    AppConfig::config_dir().join("config.toml").display().to_string()
}
