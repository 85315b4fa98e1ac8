// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Secure Channel
//!
//! Holds the single live [`SessionContext`] and encrypts/decrypts payloads
//! with it. The context sits behind an `RwLock<Option<Arc<_>>>`: installs
//! swap the whole `Arc`, and encrypt/decrypt clone it under a short read
//! lock so crypto runs without holding the lock.
//!
//! Any decrypt failure is reported as `SessionExpired` and drops the session
//! that produced it. Recovery is a new handshake.

pub mod session;

pub use session::SessionContext;

use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

use crate::crypto::{ResponseBody, SharedSecret};
use crate::error::ChannelError;

/// Session holder exposing encrypt/decrypt
#[derive(Debug, Default)]
pub struct SecureChannel {
    session: RwLock<Option<Arc<SessionContext>>>,
}

impl SecureChannel {
    /// Create an uninitialised channel
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff a session with a derived key is installed
    pub fn is_initialized(&self) -> bool {
        self.current().is_some()
    }

    /// Id of the installed session, if any
    pub fn session_id(&self) -> Option<String> {
        self.current().map(|ctx| ctx.session_id().to_string())
    }

    /// Install a session from an already agreed shared secret
    pub fn establish(
        &self,
        session_id: impl Into<String>,
        shared_secret: SharedSecret,
    ) -> Result<(), ChannelError> {
        let ctx = SessionContext::new(session_id, shared_secret)?;
        self.install(ctx);
        Ok(())
    }

    /// Replace the current session wholesale
    pub(crate) fn install(&self, ctx: SessionContext) {
        let session_id = ctx.session_id().to_string();
        let previous = self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Arc::new(ctx));

        match previous {
            Some(old) => info!(
                "🔑 Session {} installed (replacing {})",
                session_id,
                old.session_id()
            ),
            None => info!("🔑 Session {} installed", session_id),
        }
    }

    /// Drop the current session, if any
    pub fn invalidate(&self) {
        let previous = self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(ctx) = previous {
            info!("🗑️  Session {} invalidated", ctx.session_id());
        }
    }

    /// Encrypt a plaintext into `base64(iv | ciphertext)`
    pub fn encrypt(&self, plaintext: &str) -> Result<String, ChannelError> {
        let ctx = self
            .current()
            .ok_or_else(|| ChannelError::Precondition("encrypt called before key exchange".to_string()))?;
        self.encrypt_with(&ctx, plaintext)
    }

    /// Decrypt a session envelope back into plaintext
    ///
    /// A plaintext JSON error reply fails immediately without touching the
    /// cipher. Every failure is `SessionExpired` and invalidates the session.
    pub fn decrypt(&self, envelope: &str) -> Result<String, ChannelError> {
        let ctx = self
            .current()
            .ok_or_else(|| ChannelError::Precondition("decrypt called before key exchange".to_string()))?;
        self.decrypt_with(&ctx, envelope)
    }

    /// Encrypt under a specific session rather than whichever is current
    pub(crate) fn encrypt_with(
        &self,
        ctx: &Arc<SessionContext>,
        plaintext: &str,
    ) -> Result<String, ChannelError> {
        let envelope = ctx.key().seal(plaintext.as_bytes())?;
        Ok(envelope.encode())
    }

    /// Decrypt under a specific session; a failure expires only that session
    pub(crate) fn decrypt_with(
        &self,
        ctx: &Arc<SessionContext>,
        envelope: &str,
    ) -> Result<String, ChannelError> {
        let result = match ResponseBody::classify(envelope) {
            Ok(ResponseBody::PlainError { message }) => Err(ChannelError::session_expired(
                format!("server replied with plaintext error: {}", message),
            )),
            Ok(ResponseBody::Envelope(envelope)) => ctx
                .key()
                .open(&envelope)
                .map_err(|e| ChannelError::session_expired(e.to_string()))
                .and_then(|bytes| {
                    String::from_utf8(bytes).map_err(|e| {
                        ChannelError::session_expired(format!("plaintext is not UTF-8: {}", e))
                    })
                }),
            Err(e) => Err(ChannelError::session_expired(e.to_string())),
        };

        if let Err(err) = &result {
            self.expire(ctx, err);
        }
        result
    }

    /// The installed session, pinned for the duration of one request
    pub(crate) fn current(&self) -> Option<Arc<SessionContext>> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drop `failed` unless a newer session has replaced it already
    fn expire(&self, failed: &Arc<SessionContext>, err: &ChannelError) {
        let mut slot = self.session.write().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, failed)) {
            *slot = None;
            warn!("⚠️  Session {} expired: {}", failed.session_id(), err);
        }
    }
}
