// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Secure request dispatcher
//!
//! Sends application requests with auth headers and the session header.
//! With an initialised channel, bodies go out as `text/plain` envelopes and
//! responses are decrypted. Without one, plain JSON is sent and received
//! (bypass mode for development servers).

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::channel::SecureChannel;
use crate::config::{ClientConfig, HEADER_SESSION_ID};
use crate::crypto::ClientAuthenticator;
use crate::error::ChannelError;

/// Wraps application calls with channel encryption
#[derive(Debug, Clone)]
pub struct SecureRequestDispatcher {
    http: Client,
    config: Arc<ClientConfig>,
    authenticator: ClientAuthenticator,
    channel: Arc<SecureChannel>,
}

impl SecureRequestDispatcher {
    pub fn new(
        http: Client,
        config: Arc<ClientConfig>,
        authenticator: ClientAuthenticator,
        channel: Arc<SecureChannel>,
    ) -> Self {
        Self {
            http,
            config,
            authenticator,
            channel,
        }
    }

    /// Send a request and return the (decrypted) response text
    ///
    /// `body` is the plaintext JSON document, if any.
    pub async fn send_raw(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<String, ChannelError> {
        let url = self.config.endpoint(path);
        // One session for header, body and reply even if a handshake lands mid-request
        let session = self.channel.current();

        let mut headers = self
            .authenticator
            .credential()
            .headers(self.config.origin());
        if let Some(ctx) = &session {
            match HeaderValue::from_str(ctx.session_id()) {
                Ok(value) => {
                    headers.insert(HEADER_SESSION_ID, value);
                }
                Err(e) => warn!("Session id is not a valid header value: {}", e),
            }
        }

        let mut request = self.http.request(method.clone(), &url).headers(headers);
        if let Some(body) = body {
            request = match &session {
                Some(ctx) => request
                    .header(CONTENT_TYPE, "text/plain")
                    .body(self.channel.encrypt_with(ctx, &body)?),
                None => request.header(CONTENT_TYPE, "application/json").body(body),
            };
        }

        debug!(
            "{} {} ({})",
            method,
            url,
            if session.is_some() { "encrypted" } else { "plaintext" }
        );

        let response = request.send().await.map_err(|e| {
            warn!("⚠️  Request to {} failed at transport level: {}", url, e);
            ChannelError::CertificateOrNetwork(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChannelError::Http {
                status: status.as_u16(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ChannelError::CertificateOrNetwork(e.to_string()))?;

        match &session {
            Some(ctx) if !text.trim().is_empty() => self.channel.decrypt_with(ctx, &text),
            _ => Ok(text),
        }
    }

    /// Send a typed request and parse the typed response
    ///
    /// An empty response body is parsed as JSON `null`.
    pub async fn send<B, R>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<R, ChannelError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ChannelError::Encryption(format!("cannot serialise request body: {}", e)))?;

        let text = self.send_raw(method, path, body).await?;
        let json = if text.trim().is_empty() { "null" } else { text.as_str() };

        serde_json::from_str(json).map_err(|e| ChannelError::InvalidResponse(e.to_string()))
    }

    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ChannelError> {
        self.send::<(), R>(Method::GET, path, None).await
    }

    pub async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ChannelError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put<B, R>(&self, path: &str, body: &B) -> Result<R, ChannelError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn delete<R: DeserializeOwned>(&self, path: &str) -> Result<R, ChannelError> {
        self.send::<(), R>(Method::DELETE, path, None).await
    }
}
