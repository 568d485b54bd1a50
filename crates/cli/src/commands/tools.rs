//! `chatrelay tools`: list the tool catalog.

use anyhow::Context;
use chatrelay_config::AppConfig;

pub fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;
    let registry = chatrelay_tools::default_registry(&config.tools);

    println!("Available tools");
    println!("===============");
    for def in registry.list_all() {
        let enabled_by_default = config.tools.default_enabled.contains(&def.id);
        println!();
        println!(
            "  {}{}",
            def.id,
            if enabled_by_default { "  (enabled by default)" } else { "" }
        );
        println!("    {}: {}", def.display_name, def.description);
        for (name, schema) in &def.parameters.properties {
            let required = def.parameters.required.contains(name);
            println!(
                "    - {name} ({}{}): {}",
                schema.kind,
                if required { ", required" } else { "" },
                schema.description
            );
        }
    }
    println!();
    println!("  Enable per message with: chatrelay chat -m \"...\" --tool <ID>");

    Ok(())
}
