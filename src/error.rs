// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for the secure channel client
//!
//! One variant per failure class a caller has to tell apart:
//! - handshake failures (malformed initiate reply, rejected completion)
//! - session failures (not initialised, expired/invalid session)
//! - transport failures (DNS, TLS, refused connection), which point at a
//!   certificate or connectivity problem rather than a protocol one
//! - plain HTTP failures from dispatched requests

use thiserror::Error;

use crate::crypto::CryptoError;

/// Outcome of the diagnostic probe sent after an unreachable handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Probing disabled or no probe installed
    NotAttempted,
    /// Probe request went out and some response came back
    Reached,
    /// Probe request failed at the transport level too
    Unreachable,
}

/// Errors surfaced by the handshake, channel and dispatcher
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// Initiate reply was non-2xx, unparsable, or missing fields
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// Complete-handshake request returned a non-2xx status
    #[error("Handshake completion rejected with HTTP {status}")]
    HandshakeCompletion { status: u16 },

    /// No usable shared secret to derive a session key from
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encrypt/decrypt called before a session was established
    #[error("Secure channel not initialised: {0}")]
    Precondition(String),

    /// Session is gone or the payload could not be decrypted; re-run the handshake
    #[error("Session expired or invalid: {reason}")]
    SessionExpired { reason: String },

    /// DNS, TLS or connection failure; likely a certificate or connectivity issue
    #[error("Certificate or network error: {0}")]
    CertificateOrNetwork(String),

    /// Non-2xx response from a dispatched request
    #[error("HTTP error {status}")]
    Http { status: u16 },

    /// Handshake could not reach the server at all
    #[error("Handshake server unreachable ({probe:?} probe): {cause}")]
    HandshakeUnreachable { cause: String, probe: ProbeOutcome },

    /// Handshake was cancelled by the caller
    #[error("Handshake cancelled")]
    Cancelled,

    /// Handshake exceeded its time budget
    #[error("Handshake timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// Decrypted/plain response did not match the expected JSON shape
    #[error("Invalid response body: {0}")]
    InvalidResponse(String),

    /// Outgoing payload could not be encrypted or serialised
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ChannelError {
    pub(crate) fn session_expired(reason: impl Into<String>) -> Self {
        ChannelError::SessionExpired {
            reason: reason.into(),
        }
    }

    /// The session is gone; a fresh handshake is needed (not a credential problem)
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ChannelError::SessionExpired { .. })
    }

    /// Transport or trust problem outside the protocol
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            ChannelError::CertificateOrNetwork(_) | ChannelError::HandshakeUnreachable { .. }
        )
    }

    /// Recoverable by running the handshake again
    pub fn requires_handshake(&self) -> bool {
        matches!(
            self,
            ChannelError::SessionExpired { .. } | ChannelError::Precondition(_)
        )
    }
}

impl From<CryptoError> for ChannelError {
    fn from(err: CryptoError) -> Self {
        match &err {
            CryptoError::KeyDerivationFailed { .. } => ChannelError::KeyDerivation(err.to_string()),
            _ => ChannelError::Encryption(err.to_string()),
        }
    }
}
