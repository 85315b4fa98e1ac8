// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Connectivity probe
//!
//! When the initiate request cannot reach the server at all, one bare
//! request is sent to the same URL before the failure is reported. The
//! response is never read. Its only use is to exercise the network path,
//! for example so an embedding environment can surface a certificate
//! prompt. The hook is pluggable because what it should detect depends on
//! the deployment.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::ProbeOutcome;

/// Diagnostic hook run once after a transport-level handshake failure
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// Sends one GET with no authentication headers and discards the response
#[derive(Debug, Clone)]
pub struct UnauthenticatedProbe {
    http: Client,
}

impl UnauthenticatedProbe {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ConnectivityProbe for UnauthenticatedProbe {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        match self.http.get(url).send().await {
            Ok(response) => {
                debug!("Connectivity probe reached {} (body discarded)", url);
                drop(response);
                ProbeOutcome::Reached
            }
            Err(e) => {
                warn!("Connectivity probe to {} failed: {}", url, e);
                ProbeOutcome::Unreachable
            }
        }
    }
}
