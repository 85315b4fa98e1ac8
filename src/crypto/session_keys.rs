// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Session Key Derivation
//!
//! The symmetric session key is `SHA-256(shared_secret)` imported as an
//! AES-256-GCM key. The resulting [`SessionKey`] is a handle over the
//! initialised cipher: it can seal and open envelopes but offers no way to
//! read the key bytes back out.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::Zeroizing;

use super::envelope::{EncryptedEnvelope, IV_LEN};
use super::error::CryptoError;

/// Non-extractable AES-256-GCM session key
pub struct SessionKey {
    cipher: Aes256Gcm,
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(<non-extractable>)")
    }
}

/// Derive the AES-256-GCM session key from an ECDH shared secret
///
/// Fails with `KeyDerivationFailed` when the secret is empty.
pub fn derive_session_key(shared_secret: &[u8]) -> Result<SessionKey, CryptoError> {
    let material = key_material(shared_secret)?;
    let cipher = Aes256Gcm::new_from_slice(material.as_slice())
        .map_err(|e| CryptoError::derivation("session_key", e.to_string()))?;
    Ok(SessionKey { cipher })
}

fn key_material(shared_secret: &[u8]) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
    if shared_secret.is_empty() {
        return Err(CryptoError::derivation(
            "session_key",
            "shared secret is empty",
        ));
    }

    let mut material = Zeroizing::new([0u8; 32]);
    material.copy_from_slice(&Sha256::digest(shared_secret));
    Ok(material)
}

impl SessionKey {
    /// Encrypt under a fresh random 96-bit IV
    pub fn seal(&self, plaintext: &[u8]) -> Result<EncryptedEnvelope, CryptoError> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);
        self.seal_with_iv(iv, plaintext)
    }

    fn seal_with_iv(
        &self,
        iv: [u8; IV_LEN],
        plaintext: &[u8],
    ) -> Result<EncryptedEnvelope, CryptoError> {
        // No AAD
        let ciphertext = self
            .cipher
            .encrypt(
                Nonce::from_slice(&iv),
                Payload {
                    msg: plaintext,
                    aad: b"",
                },
            )
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        Ok(EncryptedEnvelope { iv, ciphertext })
    }

    /// Decrypt and authenticate an envelope
    pub fn open(&self, envelope: &EncryptedEnvelope) -> Result<Vec<u8>, CryptoError> {
        self.cipher
            .decrypt(
                Nonce::from_slice(&envelope.iv),
                Payload {
                    msg: &envelope.ciphertext,
                    aad: b"",
                },
            )
            .map_err(|_| {
                CryptoError::DecryptionFailed(
                    "authentication tag mismatch (wrong key or corrupted data)".to_string(),
                )
            })
    }
}
