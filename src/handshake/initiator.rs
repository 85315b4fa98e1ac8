// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Key exchange initiator
//!
//! Runs one handshake against the server:
//! 1. Generate an ephemeral P-256 keypair
//! 2. `GET initiate-handshake` with signed auth headers, expecting
//!    `{sessionId, serverPublicKey}`
//! 3. Import the server key and export ours as base64 SPKI
//! 4. `POST complete-handshake` with `{sessionId, clientPublicKey}` and fresh headers
//! 5. ECDH, then SHA-256 into the AES-GCM session key
//!
//! Progress is published on a `watch` channel. Timeout or cancellation
//! drops every partial value and ends in `Failed`; only a fully derived
//! [`SessionContext`] is ever returned.

use reqwest::Client;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::messages::{CompleteRequest, InitiateResponse};
use super::probe::ConnectivityProbe;
use super::state::HandshakeState;
use crate::channel::SessionContext;
use crate::config::{ClientConfig, COMPLETE_HANDSHAKE_PATH, INITIATE_HANDSHAKE_PATH};
use crate::crypto::{ClientAuthenticator, ClientKeyPair, ServerPublicKey};
use crate::error::{ChannelError, ProbeOutcome};

/// Drives the handshake state machine
pub struct KeyExchangeInitiator {
    http: Client,
    config: Arc<ClientConfig>,
    authenticator: ClientAuthenticator,
    probe: Option<Arc<dyn ConnectivityProbe>>,
    state: watch::Sender<HandshakeState>,
}

impl KeyExchangeInitiator {
    pub fn new(
        http: Client,
        config: Arc<ClientConfig>,
        authenticator: ClientAuthenticator,
        probe: Option<Arc<dyn ConnectivityProbe>>,
    ) -> Self {
        let (state, _) = watch::channel(HandshakeState::Idle);
        Self {
            http,
            config,
            authenticator,
            probe,
            state,
        }
    }

    /// Replace the diagnostic probe (`None` disables it)
    pub fn set_probe(&mut self, probe: Option<Arc<dyn ConnectivityProbe>>) {
        self.probe = probe;
    }

    /// Current handshake state
    pub fn state(&self) -> HandshakeState {
        *self.state.borrow()
    }

    /// Receiver notified on every state change
    pub fn subscribe_state(&self) -> watch::Receiver<HandshakeState> {
        self.state.subscribe()
    }

    /// Run one handshake bounded by the configured timeout and `cancel`
    pub async fn run(&self, cancel: &CancellationToken) -> Result<SessionContext, ChannelError> {
        self.transition(HandshakeState::Idle);

        let timeout = self.config.handshake_timeout();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ChannelError::Cancelled),
            result = tokio::time::timeout(timeout, self.exchange()) => match result {
                Ok(result) => result,
                Err(_) => Err(ChannelError::Timeout {
                    after_ms: self.config.handshake_timeout_ms,
                }),
            },
        };

        match &outcome {
            Ok(ctx) => {
                self.transition(HandshakeState::Ready);
                info!("✅ Key exchange complete for session {}", ctx.session_id());
            }
            Err(e) => {
                self.transition(HandshakeState::Failed);
                warn!("❌ Key exchange failed: {}", e);
            }
        }
        outcome
    }

    async fn exchange(&self) -> Result<SessionContext, ChannelError> {
        let keypair = ClientKeyPair::generate();

        self.transition(HandshakeState::HandshakeRequested);
        let (session_id, server_key) = self.initiate().await?;

        let server_public = ServerPublicKey::from_spki_base64(&server_key)
            .map_err(|e| ChannelError::Handshake(e.to_string()))?;
        let client_public = keypair
            .public_key_spki_base64()
            .map_err(|e| ChannelError::Handshake(e.to_string()))?;

        self.complete(&session_id, client_public).await?;
        self.transition(HandshakeState::HandshakeCompleted);

        let shared_secret = keypair.derive_shared_secret(&server_public);
        self.transition(HandshakeState::SecretDerived);

        SessionContext::new(session_id, shared_secret)
    }

    async fn initiate(&self) -> Result<(String, String), ChannelError> {
        let url = self.config.endpoint(INITIATE_HANDSHAKE_PATH);
        let headers = self.authenticator.credential().headers(self.config.origin());

        let response = match self.http.get(&url).headers(headers).send().await {
            Ok(response) => response,
            Err(e) => return Err(self.unreachable(&url, e).await),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(ChannelError::Handshake(format!(
                "initiate-handshake returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: InitiateResponse = response.json().await.map_err(|e| {
            ChannelError::Handshake(format!("malformed initiate-handshake response: {}", e))
        })?;
        let (session_id, server_key) = body.into_parts()?;
        debug!("Handshake initiated, session {}", session_id);

        Ok((session_id, server_key))
    }

    async fn complete(&self, session_id: &str, client_public_key: String) -> Result<(), ChannelError> {
        let url = self.config.endpoint(COMPLETE_HANDSHAKE_PATH);
        let headers = self.authenticator.credential().headers(self.config.origin());
        let body = CompleteRequest {
            session_id: session_id.to_string(),
            client_public_key,
        };

        let response = self
            .http
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChannelError::CertificateOrNetwork(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChannelError::HandshakeCompletion {
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    /// Wrap a transport failure of the initiate request, probing once first
    async fn unreachable(&self, url: &str, err: reqwest::Error) -> ChannelError {
        warn!("⚠️  Handshake could not reach {}: {}", url, err);

        let probe = match (&self.probe, self.config.probe_on_transport_failure) {
            (Some(probe), true) => probe.probe(url).await,
            _ => ProbeOutcome::NotAttempted,
        };

        ChannelError::HandshakeUnreachable {
            cause: err.to_string(),
            probe,
        }
    }

    fn transition(&self, next: HandshakeState) {
        let previous = self.state.send_replace(next);
        if !previous.can_transition_to(next) {
            warn!("Unexpected handshake transition {} -> {}", previous, next);
        } else {
            debug!("Handshake state {} -> {}", previous, next);
        }
    }
}
