// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ECDH Key Exchange Implementation
//!
//! Ephemeral-ephemeral Elliptic Curve Diffie-Hellman over NIST P-256.
//! Public keys cross the wire as base64-encoded SubjectPublicKeyInfo (DER).
//!
//! The client keypair is generated per handshake attempt and consumed by
//! [`ClientKeyPair::derive_shared_secret`], so it cannot outlive the exchange.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use p256::{
    ecdh::EphemeralSecret,
    pkcs8::{DecodePublicKey, EncodePublicKey},
    PublicKey,
};
use rand::rngs::OsRng;
use std::fmt;
use zeroize::Zeroizing;

use super::envelope::decode_base64_lenient;
use super::error::CryptoError;

/// Raw ECDH output (x-coordinate of the shared point, 32 bytes for P-256)
///
/// Zeroed on drop. Readable only inside the crate.
pub struct SharedSecret(Zeroizing<Vec<u8>>);

impl SharedSecret {
    /// Wrap externally agreed secret bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(Zeroizing::new(bytes.to_vec()))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedSecret(<{} bytes>)", self.0.len())
    }
}

/// Server's P-256 public key, imported once per handshake
#[derive(Debug, Clone)]
pub struct ServerPublicKey(PublicKey);

impl ServerPublicKey {
    /// Import a base64 SPKI public key (padding optional)
    pub fn from_spki_base64(encoded: &str) -> Result<Self, CryptoError> {
        let der = decode_base64_lenient(encoded)
            .map_err(|e| CryptoError::invalid_key("server_public_key", e.to_string()))?;
        Self::from_spki_der(&der)
    }

    /// Import a DER SPKI public key
    pub fn from_spki_der(der: &[u8]) -> Result<Self, CryptoError> {
        PublicKey::from_public_key_der(der)
            .map(Self)
            .map_err(|e| {
                CryptoError::invalid_key(
                    "server_public_key",
                    format!("not a P-256 SPKI public key: {}", e),
                )
            })
    }
}

/// Ephemeral client keypair for one handshake attempt
pub struct ClientKeyPair {
    secret: EphemeralSecret,
    public: PublicKey,
}

impl fmt::Debug for ClientKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientKeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

impl ClientKeyPair {
    /// Generate a fresh keypair from the OS RNG
    pub fn generate() -> Self {
        let secret = EphemeralSecret::random(&mut OsRng);
        let public = secret.public_key();
        Self { secret, public }
    }

    /// Export the public half as base64 SPKI
    pub fn public_key_spki_base64(&self) -> Result<String, CryptoError> {
        let der = self
            .public
            .to_public_key_der()
            .map_err(|e| CryptoError::invalid_key("client_public_key", e.to_string()))?;
        Ok(STANDARD.encode(der.as_bytes()))
    }

    /// ECDH(server_public, client_private), consuming the keypair
    pub fn derive_shared_secret(self, server: &ServerPublicKey) -> SharedSecret {
        let shared = self.secret.diffie_hellman(&server.0);
        SharedSecret::from_bytes(shared.raw_secret_bytes().as_slice())
    }
}
