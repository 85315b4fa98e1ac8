// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ClientConfig;

/// Secure Channel Client CLI
#[derive(Parser, Debug)]
#[command(name = "securechannel-cli")]
#[command(version)]
#[command(about = "Establish and exercise an encrypted session with a secure-channel server", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// TOML configuration file (otherwise SECURE_CHANNEL_* environment variables)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the server base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Override the client id
    #[arg(long, global = true)]
    pub client_id: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Perform the key exchange and print the session id
    Handshake,

    /// Send one request through the secure dispatcher
    Request(commands::RequestArgs),

    /// Encrypt a plaintext offline with a known shared secret
    Seal(commands::SealArgs),

    /// Decrypt an envelope offline with a known shared secret
    Open(commands::OpenArgs),

    /// Print version, User-Agent and supported features as JSON
    Version,
}

/// Resolve configuration: `.env`, then file or environment, then flags
pub fn load_config(global: &GlobalArgs) -> Result<ClientConfig> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let mut config = match &global.config {
        Some(path) => ClientConfig::from_toml_file(path)?,
        None => ClientConfig::from_env(),
    };

    if let Some(base_url) = &global.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(client_id) = &global.client_id {
        config.client_id = client_id.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Handshake => commands::handshake(&cli.global).await,
        Commands::Request(args) => commands::request(&cli.global, args).await,
        Commands::Seal(args) => commands::seal(args),
        Commands::Open(args) => commands::open(args),
        Commands::Version => commands::version(),
    }
}
