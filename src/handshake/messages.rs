// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Handshake wire messages

use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

/// Body of `GET /api/security/initiate-handshake`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateResponse {
    #[serde(default)]
    pub session_id: Option<String>,
    /// Base64 SPKI P-256 public key
    #[serde(default)]
    pub server_public_key: Option<String>,
}

impl InitiateResponse {
    /// Both fields present and non-empty, as `(session_id, server_public_key)`
    pub fn into_parts(self) -> Result<(String, String), ChannelError> {
        let session_id = self
            .session_id
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ChannelError::Handshake("response missing sessionId".to_string()))?;
        let server_public_key = self
            .server_public_key
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ChannelError::Handshake("response missing serverPublicKey".to_string())
            })?;
        Ok((session_id, server_public_key))
    }
}

/// Body of `POST /api/security/complete-handshake`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    pub session_id: String,
    /// Base64 SPKI P-256 public key
    pub client_public_key: String,
}
