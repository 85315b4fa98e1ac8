// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Secure Channel Cryptography
//!
//! Primitives behind the handshake and the session channel:
//!
//! - **Auth**: HMAC-SHA256 timestamp signatures proving client identity
//! - **ECDH**: Ephemeral P-256 key agreement with SPKI-encoded public keys
//! - **Session Keys**: SHA-256 of the shared secret as a non-extractable AES-256-GCM key
//! - **Envelope**: `base64(iv | ciphertext)` wire format and response classification
//!
//! ## Security Considerations
//!
//! - Shared secrets and key digests are zeroed on drop
//! - Every encryption draws a fresh random 96-bit IV
//! - No API returns session key bytes
//!
//! ## Protocol Flow
//!
//! 1. Client generates an ephemeral P-256 keypair
//! 2. Client fetches the server's SPKI public key and a session id (signed request)
//! 3. Client posts its own SPKI public key to complete the handshake
//! 4. Both sides compute ECDH and hash the result with SHA-256
//! 5. All payloads travel as AES-256-GCM envelopes under that key

pub mod auth;
pub mod ecdh;
pub mod envelope;
pub mod error;
pub mod session_keys;

pub use auth::{ClientAuthenticator, ClientCredential};
pub use ecdh::{ClientKeyPair, ServerPublicKey, SharedSecret};
pub use envelope::{decode_base64_lenient, EncryptedEnvelope, ResponseBody, IV_LEN};
pub use error::CryptoError;
pub use session_keys::{derive_session_key, SessionKey};
