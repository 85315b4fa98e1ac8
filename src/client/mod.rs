// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Secure client
//!
//! The surface the rest of an application depends on:
//! `perform_key_exchange`, `is_initialized`, `session_id`, `encrypt`,
//! `decrypt`, plus the request dispatcher built on the same channel.
//!
//! Handshakes are serialised: a second call waits for the first to finish,
//! so two exchanges never race to install a session.

use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::channel::SecureChannel;
use crate::config::ClientConfig;
use crate::crypto::ClientAuthenticator;
use crate::dispatcher::SecureRequestDispatcher;
use crate::error::ChannelError;
use crate::handshake::{ConnectivityProbe, HandshakeState, KeyExchangeInitiator, UnauthenticatedProbe};
use crate::version::USER_AGENT;

/// Outcome of `perform_key_exchange`
///
/// The shared secret is deliberately absent: key material stays inside the
/// channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyExchangeResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Typed failure for programmatic callers
    #[serde(skip)]
    pub error_kind: Option<ChannelError>,
}

impl KeyExchangeResult {
    fn established(session_id: String) -> Self {
        Self {
            success: true,
            session_id: Some(session_id),
            error: None,
            error_kind: None,
        }
    }

    fn failed(err: ChannelError) -> Self {
        Self {
            success: false,
            session_id: None,
            error: Some(err.to_string()),
            error_kind: Some(err),
        }
    }
}

/// Handshake, channel and dispatcher wired to one configuration
pub struct SecureClient {
    config: Arc<ClientConfig>,
    channel: Arc<SecureChannel>,
    initiator: KeyExchangeInitiator,
    dispatcher: SecureRequestDispatcher,
    handshake_lock: Mutex<()>,
}

impl SecureClient {
    /// Build a client; fails with `Config` on invalid settings
    pub fn new(config: ClientConfig) -> Result<Self, ChannelError> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ChannelError::Config(format!("cannot build HTTP client: {}", e)))?;

        let config = Arc::new(config);
        let authenticator = ClientAuthenticator::new(config.client_id.clone(), config.auth_key.as_bytes());
        let channel = Arc::new(SecureChannel::new());
        let probe: Arc<dyn ConnectivityProbe> = Arc::new(UnauthenticatedProbe::new(http.clone()));

        let initiator = KeyExchangeInitiator::new(
            http.clone(),
            config.clone(),
            authenticator.clone(),
            Some(probe),
        );
        let dispatcher =
            SecureRequestDispatcher::new(http, config.clone(), authenticator, channel.clone());

        Ok(Self {
            config,
            channel,
            initiator,
            dispatcher,
            handshake_lock: Mutex::new(()),
        })
    }

    /// Replace the diagnostic probe (`None` disables it)
    pub fn with_probe(mut self, probe: Option<Arc<dyn ConnectivityProbe>>) -> Self {
        self.initiator.set_probe(probe);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run the handshake and install the resulting session
    pub async fn perform_key_exchange(&self) -> KeyExchangeResult {
        self.perform_key_exchange_with_cancel(&CancellationToken::new())
            .await
    }

    /// Like `perform_key_exchange`, abandoning the handshake when `cancel` fires
    ///
    /// On failure the previously installed session (if any) is left as is.
    pub async fn perform_key_exchange_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> KeyExchangeResult {
        let _guard = self.handshake_lock.lock().await;

        match self.initiator.run(cancel).await {
            Ok(ctx) => {
                let session_id = ctx.session_id().to_string();
                self.channel.install(ctx);
                KeyExchangeResult::established(session_id)
            }
            Err(e) => KeyExchangeResult::failed(e),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.channel.is_initialized()
    }

    pub fn session_id(&self) -> Option<String> {
        self.channel.session_id()
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, ChannelError> {
        self.channel.encrypt(plaintext)
    }

    pub fn decrypt(&self, envelope: &str) -> Result<String, ChannelError> {
        self.channel.decrypt(envelope)
    }

    /// Drop the current session (e.g. on logout)
    pub fn invalidate(&self) {
        self.channel.invalidate()
    }

    pub fn channel(&self) -> &Arc<SecureChannel> {
        &self.channel
    }

    pub fn dispatcher(&self) -> &SecureRequestDispatcher {
        &self.dispatcher
    }

    pub fn handshake_state(&self) -> HandshakeState {
        self.initiator.state()
    }

    pub fn subscribe_handshake_state(&self) -> watch::Receiver<HandshakeState> {
        self.initiator.subscribe_state()
    }
}
