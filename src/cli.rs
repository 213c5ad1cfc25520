use crate::config::{DEFAULT_CONFIG_FILE, load_config};
use crate::gateway;
use crate::state::AppState;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "voxrelay")]
#[command(about = "Webhook-driven chat relay", version)]
pub struct Cli {
    /// Path to the JSON configuration file (defaults to ./voxrelay.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured listen port
    #[arg(short, long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook gateway (default)
    Serve,
    /// Load and validate the configuration, then exit
    CheckConfig,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())
        .with_context(|| format!("loading {}", DEFAULT_CONFIG_FILE))?;
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            info!(version = crate::VERSION, "starting voxrelay");
            let state = Arc::new(AppState::from_config(config));
            gateway::serve(state).await
        }
        Commands::CheckConfig => {
            let enabled: Vec<&str> = [
                ("twilio", config.channels.twilio.enabled),
                ("whatsapp", config.channels.whatsapp.enabled),
                ("messenger", config.channels.messenger.enabled),
            ]
            .iter()
            .filter_map(|(name, on)| on.then_some(*name))
            .collect();
            println!("config ok");
            println!("  channels: {}", enabled.join(", "));
            println!("  backends: {}", config.completion.backends.len());
            Ok(())
        }
    }
}
