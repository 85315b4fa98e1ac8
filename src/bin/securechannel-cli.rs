// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use securechannel_client::cli::{execute, Cli};
use securechannel_client::version;
use securechannel_client::ChannelError;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    // Parse CLI arguments
    let cli = Cli::parse();
    debug!("{}", version::get_version_string());

    // Execute the command
    match execute(cli).await {
        Ok(()) => Ok(()),
        Err(e) => {
            match e.downcast_ref::<ChannelError>() {
                Some(err) if err.is_session_expired() => {
                    eprintln!("❌ Session expired, run the handshake again: {}", err)
                }
                Some(err) if err.is_connectivity() => {
                    eprintln!("❌ Cannot reach the server (certificate or network): {}", err)
                }
                _ => eprintln!("❌ Error: {}", e),
            }
            std::process::exit(1);
        }
    }
}
