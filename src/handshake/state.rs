// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Handshake protocol states

use serde::Serialize;
use std::fmt;

/// Progress of a key exchange
///
/// `Idle → HandshakeRequested → HandshakeCompleted → SecretDerived → Ready`,
/// with `Failed` reachable from every state. Only `Ready` means a session
/// was installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandshakeState {
    Idle,
    HandshakeRequested,
    HandshakeCompleted,
    SecretDerived,
    Ready,
    Failed,
}

impl HandshakeState {
    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(self, next: HandshakeState) -> bool {
        use HandshakeState::*;
        matches!(
            (self, next),
            (_, Failed)
                | (Idle, HandshakeRequested)
                | (HandshakeRequested, HandshakeCompleted)
                | (HandshakeCompleted, SecretDerived)
                | (SecretDerived, Ready)
                | (Ready, Idle)
                | (Failed, Idle)
                | (Idle, Idle)
        )
    }
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandshakeState::Idle => "idle",
            HandshakeState::HandshakeRequested => "handshake_requested",
            HandshakeState::HandshakeCompleted => "handshake_completed",
            HandshakeState::SecretDerived => "secret_derived",
            HandshakeState::Ready => "ready",
            HandshakeState::Failed => "failed",
        };
        f.write_str(name)
    }
}
