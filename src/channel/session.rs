// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Session context produced by a completed handshake

use std::fmt;

use crate::crypto::{derive_session_key, SessionKey, SharedSecret};
use crate::error::ChannelError;

/// Identity and key material of one live session
///
/// Built in one step from a session id and shared secret; never mutated
/// afterwards. A new handshake produces a new context.
pub struct SessionContext {
    session_id: String,
    shared_secret: SharedSecret,
    key: SessionKey,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("session_id", &self.session_id)
            .field("shared_secret", &self.shared_secret)
            .field("key", &self.key)
            .finish()
    }
}

impl SessionContext {
    /// Derive the session key and assemble the context
    ///
    /// Fails with `KeyDerivation` if the shared secret is empty.
    pub fn new(session_id: impl Into<String>, shared_secret: SharedSecret) -> Result<Self, ChannelError> {
        let key = derive_session_key(shared_secret.as_bytes())?;
        Ok(Self {
            session_id: session_id.into(),
            shared_secret,
            key,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub(crate) fn key(&self) -> &SessionKey {
        &self.key
    }
}
