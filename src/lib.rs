// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod channel;
pub mod cli;
pub mod client;
pub mod config;
pub mod crypto;
pub mod dispatcher;
pub mod error;
pub mod handshake;
pub mod version;

// Re-export the outward surface
pub use channel::{SecureChannel, SessionContext};
pub use client::{KeyExchangeResult, SecureClient};
pub use config::ClientConfig;
pub use crypto::{ClientAuthenticator, CryptoError, SharedSecret};
pub use dispatcher::SecureRequestDispatcher;
pub use error::{ChannelError, ProbeOutcome};
pub use handshake::{ConnectivityProbe, HandshakeState, KeyExchangeInitiator, UnauthenticatedProbe};
