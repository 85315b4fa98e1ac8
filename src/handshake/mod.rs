// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Authenticated ECDH handshake with the server
//!
//! - **initiator**: the two-request key exchange and its state machine
//! - **messages**: JSON bodies of the handshake endpoints
//! - **probe**: optional diagnostic request after a transport failure
//! - **state**: `HandshakeState` and its legal transitions

pub mod initiator;
pub mod messages;
pub mod probe;
pub mod state;

pub use initiator::KeyExchangeInitiator;
pub use messages::{CompleteRequest, InitiateResponse};
pub use probe::{ConnectivityProbe, UnauthenticatedProbe};
pub use state::HandshakeState;
