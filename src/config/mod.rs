// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Client configuration
//!
//! Loaded from environment variables, a TOML file, or built directly.
//! Every field has a default so a partial file or environment is enough.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::error::ChannelError;

/// Path of the handshake-initiate endpoint (GET)
pub const INITIATE_HANDSHAKE_PATH: &str = "/api/security/initiate-handshake";
/// Path of the handshake-complete endpoint (POST)
pub const COMPLETE_HANDSHAKE_PATH: &str = "/api/security/complete-handshake";

pub const HEADER_CLIENT_ID: &str = "x-client-id";
pub const HEADER_TIMESTAMP: &str = "x-timestamp";
pub const HEADER_SIGNATURE: &str = "x-signature";
pub const HEADER_SESSION_ID: &str = "x-session-id";
pub const HEADER_ORIGIN: &str = "origin";

/// Secure channel client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server base URL, e.g. `https://api.example.com`
    pub base_url: String,
    /// Identifier sent as `X-Client-ID` and signed with the timestamp
    pub client_id: String,
    /// Pre-shared HMAC key; empty means requests go out unsigned
    #[serde(skip_serializing)]
    pub auth_key: String,
    /// `Origin` header value (default: base URL)
    pub origin: Option<String>,
    /// Timeout for each dispatched request in milliseconds (default: 30000)
    pub request_timeout_ms: u64,
    /// Budget for a whole handshake in milliseconds (default: 15000)
    pub handshake_timeout_ms: u64,
    /// Send the diagnostic probe when the handshake cannot reach the server (default: true)
    pub probe_on_transport_failure: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            client_id: "web-client".to_string(),
            auth_key: String::new(),
            origin: None,
            request_timeout_ms: 30_000,
            handshake_timeout_ms: 15_000,
            probe_on_transport_failure: true,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            base_url: lookup("SECURE_CHANNEL_BASE_URL").unwrap_or(defaults.base_url),
            client_id: lookup("SECURE_CHANNEL_CLIENT_ID").unwrap_or(defaults.client_id),
            auth_key: lookup("SECURE_CHANNEL_AUTH_KEY").unwrap_or(defaults.auth_key),
            origin: lookup("SECURE_CHANNEL_ORIGIN").or(defaults.origin),
            request_timeout_ms: lookup("SECURE_CHANNEL_REQUEST_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_ms),
            handshake_timeout_ms: lookup("SECURE_CHANNEL_HANDSHAKE_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.handshake_timeout_ms),
            probe_on_transport_failure: lookup("SECURE_CHANNEL_PROBE")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.probe_on_transport_failure),
        }
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ChannelError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChannelError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| ChannelError::Config(format!("invalid TOML in {}: {}", path.display(), e)))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ChannelError> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ChannelError::Config(format!("invalid base_url '{}': {}", self.base_url, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ChannelError::Config(format!(
                "base_url must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.client_id.trim().is_empty() {
            return Err(ChannelError::Config("client_id must not be empty".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(ChannelError::Config(
                "request_timeout_ms must be at least 1".to_string(),
            ));
        }
        if self.handshake_timeout_ms == 0 {
            return Err(ChannelError::Config(
                "handshake_timeout_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Join the base URL and an absolute path
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn origin(&self) -> &str {
        self.origin
            .as_deref()
            .unwrap_or_else(|| self.base_url.trim_end_matches('/'))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}
