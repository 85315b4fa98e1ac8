// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Crypto Error Types
//!
//! Errors raised by the primitives under `crypto::*`. They carry enough
//! context to log, but the channel layer decides how each one surfaces to
//! callers (decrypt paths collapse all of them into a session-expired
//! condition).
//!
//! ## Error Variants
//!
//! - **InvalidKey**: public key could not be decoded (bad base64, bad SPKI, wrong curve)
//! - **KeyDerivationFailed**: shared secret missing/empty or ECDH/AES key setup failed
//! - **EncryptionFailed**: AES-GCM seal failed
//! - **DecryptionFailed**: AES-GCM open failed (tag mismatch, wrong key, truncated data)
//! - **InvalidEnvelope**: session envelope is not decodable base64 or is too short

use thiserror::Error;

/// Error type for all cryptographic operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Invalid public key material
    #[error("Invalid key ({key_type}): {reason}")]
    InvalidKey {
        /// Which key failed (e.g. "server_public_key")
        key_type: String,
        /// Specific failure reason
        reason: String,
    },

    /// Key derivation failed
    #[error("Key derivation failed during {operation}: {reason}")]
    KeyDerivationFailed {
        /// Which derivation step failed
        operation: String,
        /// Specific failure reason
        reason: String,
    },

    /// AEAD encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// AEAD decryption failed
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Envelope could not be decoded into IV and ciphertext
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),
}

impl CryptoError {
    pub(crate) fn invalid_key(key_type: &str, reason: impl Into<String>) -> Self {
        CryptoError::InvalidKey {
            key_type: key_type.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn derivation(operation: &str, reason: impl Into<String>) -> Self {
        CryptoError::KeyDerivationFailed {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }
}
