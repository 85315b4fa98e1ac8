// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Client Authentication
//!
//! Proves client identity on handshake and dispatched requests by signing
//! `"{client_id}:{timestamp}"` with HMAC-SHA256 under a pre-shared key.
//!
//! Signing is best-effort: when the key is missing or the MAC cannot be
//! set up, the credential is produced without a signature and the request
//! goes out unauthenticated. The server decides whether to accept it.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use sha2::Sha256;
use std::fmt;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::config::{
    HEADER_CLIENT_ID, HEADER_ORIGIN, HEADER_SIGNATURE, HEADER_TIMESTAMP,
};

type HmacSha256 = Hmac<Sha256>;

/// Per-request proof of client identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredential {
    pub client_id: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Base64 HMAC-SHA256 over `"{client_id}:{timestamp}"`, if signing succeeded
    pub signature: Option<String>,
}

impl ClientCredential {
    /// Render the credential as request headers
    ///
    /// `X-Signature` is omitted when the credential is unsigned. Values that
    /// are not valid header text are skipped with a warning.
    pub fn headers(&self, origin: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let timestamp = self.timestamp.to_string();

        insert_header(&mut headers, HEADER_CLIENT_ID, &self.client_id);
        insert_header(&mut headers, HEADER_TIMESTAMP, &timestamp);
        if let Some(signature) = &self.signature {
            insert_header(&mut headers, HEADER_SIGNATURE, signature);
        }
        insert_header(&mut headers, HEADER_ORIGIN, origin);

        headers
    }
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(HeaderName::from_static(name), value);
        }
        Err(e) => warn!("Skipping header {}: {}", name, e),
    }
}

/// Signs timestamps with the static pre-shared authentication key
#[derive(Clone)]
pub struct ClientAuthenticator {
    client_id: String,
    auth_key: Zeroizing<Vec<u8>>,
}

impl fmt::Debug for ClientAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientAuthenticator")
            .field("client_id", &self.client_id)
            .field("auth_key", &"<redacted>")
            .finish()
    }
}

impl ClientAuthenticator {
    pub fn new(client_id: impl Into<String>, auth_key: impl AsRef<[u8]>) -> Self {
        let authenticator = Self {
            client_id: client_id.into(),
            auth_key: Zeroizing::new(auth_key.as_ref().to_vec()),
        };
        if !authenticator.signs_requests() {
            warn!(
                "No authentication key configured for {}; requests will be unsigned",
                authenticator.client_id
            );
        }
        authenticator
    }

    /// Whether a key is configured to sign with
    pub fn signs_requests(&self) -> bool {
        !self.auth_key.is_empty()
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Sign `"{client_id}:{timestamp}"`
    ///
    /// Returns `None` (and logs a warning) on any failure; the caller sends
    /// the request unsigned instead of aborting it.
    pub fn sign_timestamp(&self, client_id: &str, timestamp: i64) -> Option<String> {
        if !self.signs_requests() {
            debug!("Sending unsigned credential for {}", client_id);
            return None;
        }

        let mut mac = match HmacSha256::new_from_slice(&self.auth_key) {
            Ok(mac) => mac,
            Err(e) => {
                warn!("Failed to initialise HMAC-SHA256: {}", e);
                return None;
            }
        };
        mac.update(format!("{}:{}", client_id, timestamp).as_bytes());

        Some(STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Fresh credential stamped with the current time
    pub fn credential(&self) -> ClientCredential {
        self.credential_at(chrono::Utc::now().timestamp_millis())
    }

    /// Credential for an explicit timestamp
    pub fn credential_at(&self, timestamp: i64) -> ClientCredential {
        ClientCredential {
            client_id: self.client_id.clone(),
            timestamp,
            signature: self.sign_timestamp(&self.client_id, timestamp),
        }
    }
}
