//! chatrelay CLI, the main entry point.
//!
//! Commands:
//! - `chat`    Send one message, optionally with tools and context
//! - `tools`   List the tool catalog
//! - `models`  List the model table and credential status
//! - `config`  Show, locate, validate or generate the config file

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "chatrelay",
    about = "Chat with OpenAI-compatible models that can call tools",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single message and print the answer
    Chat(commands::chat::ChatArgs),

    /// List available tools
    Tools,

    /// List known models
    Models,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config_cmd::ConfigAction,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so the answer on stdout stays pipeable.
    let filter = if cli.verbose { "debug" } else { "warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Chat(args) => commands::chat::run(args).await?,
        Commands::Tools => commands::tools::run()?,
        Commands::Models => commands::models::run()?,
        Commands::Config { action } => commands::config_cmd::run(action)?,
    }

    Ok(())
}
