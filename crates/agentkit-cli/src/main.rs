// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]

mod commands;

use std::path::PathBuf;

use agentkit_config::{AgentkitConfig, load_config, validate_config};
use agentkit_core::CancelToken;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use commands::RunMode;

#[derive(Parser, Debug)]
#[command(name = "agentkit", version, about = "agentkit sample programs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,

    /// Print agent output as it is generated.
    #[arg(long, global = true)]
    stream: bool,

    /// TOML configuration file; environment variables override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create JokerAgent, ask it for a joke, then delete it.
    Joker,

    /// Run a prompt against an agent that already exists.
    Existing {
        /// Agent name.
        #[arg(long)]
        name: String,

        /// Prompt to send.
        #[arg(long, default_value = "Hello! What can you do?")]
        prompt: String,
    },

    /// Agent with an in-process get_weather function tool.
    Weather {
        /// Location to ask about.
        #[arg(long, default_value = "Amsterdam")]
        location: String,
    },

    /// Agent backed by a hosted memory store.
    Memory {
        /// Memory scope, e.g. a user id.
        #[arg(long)]
        scope: String,

        /// Delete the scope's memories before running.
        #[arg(long)]
        clear: bool,
    },

    /// Chat with an Anthropic model.
    Claude {
        /// Prompt to send.
        #[arg(long, default_value = "Tell me a joke about a pirate.")]
        prompt: String,

        /// Bearer token sent instead of an API key.
        #[arg(long)]
        token: Option<String>,
    },
}

fn init_tracing(debug: bool, config: &AgentkitConfig) {
    let filter = if debug {
        EnvFilter::new("agentkit=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = config.log_level.as_deref().unwrap_or("warn");
            EnvFilter::new(format!("agentkit={level}"))
        })
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("load config")?;
    init_tracing(cli.debug, &config);
    for warning in validate_config(&config).context("validate config")? {
        warn!("{warning}");
    }

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let mode = RunMode { stream: cli.stream };
    match cli.command {
        Commands::Joker => commands::joker(&config, mode, &cancel).await,
        Commands::Existing { name, prompt } => {
            commands::existing(&config, &name, &prompt, mode, &cancel).await
        }
        Commands::Weather { location } => {
            commands::weather(&config, &location, mode, &cancel).await
        }
        Commands::Memory { scope, clear } => {
            commands::memory(&config, &scope, clear, mode, &cancel).await
        }
        Commands::Claude { prompt, token } => {
            commands::claude(&config, &prompt, token, mode, &cancel).await
        }
    }
}
