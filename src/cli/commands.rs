// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use clap::Args;
use reqwest::Method;
use tracing::info;

use super::{load_config, GlobalArgs};
use crate::channel::SecureChannel;
use crate::client::SecureClient;
use crate::crypto::SharedSecret;
use crate::version;

/// Arguments for the request command
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, DELETE, ...)
    #[arg(long, default_value = "GET")]
    pub method: String,

    /// Request path, e.g. /api/profile
    #[arg(long)]
    pub path: String,

    /// JSON request body
    #[arg(long)]
    pub body: Option<String>,

    /// Skip the handshake and send plain JSON (development servers)
    #[arg(long)]
    pub plain: bool,
}

/// Arguments for the seal command
#[derive(Args, Debug)]
pub struct SealArgs {
    /// Hex-encoded ECDH shared secret
    #[arg(long, env = "SECURE_CHANNEL_SESSION_SECRET")]
    pub session_secret_hex: String,

    /// Plaintext to encrypt
    pub plaintext: String,
}

/// Arguments for the open command
#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Hex-encoded ECDH shared secret
    #[arg(long, env = "SECURE_CHANNEL_SESSION_SECRET")]
    pub session_secret_hex: String,

    /// base64(iv | ciphertext) envelope
    pub envelope: String,
}

async fn connect(global: &GlobalArgs) -> Result<SecureClient> {
    let config = load_config(global)?;
    info!("Connecting to {} as {}", config.base_url, config.client_id);

    let client = SecureClient::new(config)?;
    let result = client.perform_key_exchange().await;
    match result.error_kind {
        None => Ok(client),
        Some(err) => Err(err.into()),
    }
}

/// Perform the key exchange and print the session id
pub async fn handshake(global: &GlobalArgs) -> Result<()> {
    let client = connect(global).await?;
    let session_id = client
        .session_id()
        .ok_or_else(|| anyhow!("handshake succeeded but no session is installed"))?;

    println!("✅ Session established: {}", session_id);
    Ok(())
}

/// Send one request and print the response body
pub async fn request(global: &GlobalArgs, args: RequestArgs) -> Result<()> {
    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())
        .map_err(|e| anyhow!("Invalid HTTP method '{}': {}", args.method, e))?;

    if let Some(body) = &args.body {
        serde_json::from_str::<serde_json::Value>(body)
            .map_err(|e| anyhow!("--body is not valid JSON: {}", e))?;
    }

    let client = if args.plain {
        println!("⚠️  Plain mode: payloads are NOT encrypted");
        SecureClient::new(load_config(global)?)?
    } else {
        connect(global).await?
    };

    let response = client
        .dispatcher()
        .send_raw(method, &args.path, args.body)
        .await?;

    println!("{}", response);
    Ok(())
}

fn offline_channel(secret_hex: &str) -> Result<SecureChannel> {
    let secret = hex::decode(secret_hex.trim_start_matches("0x"))
        .map_err(|e| anyhow!("Invalid shared secret hex: {}", e))?;

    let channel = SecureChannel::new();
    channel.establish("offline", SharedSecret::from_bytes(&secret))?;
    Ok(channel)
}

/// Encrypt offline with a supplied shared secret
pub fn seal(args: SealArgs) -> Result<()> {
    let channel = offline_channel(&args.session_secret_hex)?;
    println!("{}", channel.encrypt(&args.plaintext)?);
    Ok(())
}

/// Decrypt offline with a supplied shared secret
pub fn open(args: OpenArgs) -> Result<()> {
    let channel = offline_channel(&args.session_secret_hex)?;
    println!("{}", channel.decrypt(&args.envelope)?);
    Ok(())
}

/// Print version information
pub fn version() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&version::get_version_info())?);
    Ok(())
}
