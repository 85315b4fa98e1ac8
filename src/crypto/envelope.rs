// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Session Envelope Encoding
//!
//! Wire format for every encrypted payload:
//!
//! ```text
//! base64( iv (12 bytes) | ciphertext+tag (variable length) )
//! ```
//!
//! Bodies received where an envelope is expected are classified once into
//! [`ResponseBody`]: a JSON object carrying a top-level `error` or `status`
//! field is a plaintext error reply, anything else is decoded as an
//! envelope.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;

use super::error::CryptoError;

/// AES-GCM IV length in bytes
pub const IV_LEN: usize = 12;

/// Decode standard base64, tolerating missing or extra trailing padding
///
/// Trailing `=` are stripped and the input is re-padded to a multiple of 4
/// before decoding, so padded and unpadded encodings of the same bytes
/// decode identically.
pub fn decode_base64_lenient(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let trimmed = input.trim().trim_end_matches('=');
    let mut padded = String::with_capacity(trimmed.len() + 3);
    padded.push_str(trimmed);
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    STANDARD.decode(padded)
}

/// IV plus AES-GCM ciphertext (tag appended)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope {
    pub iv: [u8; IV_LEN],
    pub ciphertext: Vec<u8>,
}

impl EncryptedEnvelope {
    /// Encode as `base64(iv | ciphertext)`
    pub fn encode(&self) -> String {
        let mut raw = Vec::with_capacity(IV_LEN + self.ciphertext.len());
        raw.extend_from_slice(&self.iv);
        raw.extend_from_slice(&self.ciphertext);
        STANDARD.encode(raw)
    }

    /// Decode `base64(iv | ciphertext)`
    pub fn decode(encoded: &str) -> Result<Self, CryptoError> {
        let raw = decode_base64_lenient(encoded)
            .map_err(|e| CryptoError::InvalidEnvelope(format!("malformed base64: {}", e)))?;

        if raw.len() <= IV_LEN {
            return Err(CryptoError::InvalidEnvelope(format!(
                "expected more than {} bytes (IV + ciphertext), got {}",
                IV_LEN,
                raw.len()
            )));
        }

        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&raw[..IV_LEN]);

        Ok(Self {
            iv,
            ciphertext: raw[IV_LEN..].to_vec(),
        })
    }
}

/// A body received where ciphertext was expected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    /// Plaintext JSON error reply; the server could not encrypt
    PlainError { message: String },
    /// Encrypted session envelope
    Envelope(EncryptedEnvelope),
}

impl ResponseBody {
    /// Classify a body by structure, then decode the envelope branch
    ///
    /// No cryptographic operation happens here.
    pub fn classify(body: &str) -> Result<Self, CryptoError> {
        if let Some(message) = plain_error_message(body) {
            return Ok(ResponseBody::PlainError { message });
        }
        EncryptedEnvelope::decode(body).map(ResponseBody::Envelope)
    }
}

/// Message of a `{"error": ..}` / `{"status": ..}` object, if `body` is one
fn plain_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim_start();
    if !trimmed.starts_with('{') {
        return None;
    }

    let object = match serde_json::from_str::<Value>(trimmed).ok()? {
        Value::Object(object) => object,
        _ => return None,
    };

    if !object.contains_key("error") && !object.contains_key("status") {
        return None;
    }

    let message = ["error", "message", "status"]
        .iter()
        .filter_map(|field| object.get(*field))
        .find_map(|value| match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Null => None,
            Value::String(_) => None,
            other => Some(other.to_string()),
        })
        .unwrap_or_else(|| "server returned a plaintext error".to_string());

    Some(message)
}
