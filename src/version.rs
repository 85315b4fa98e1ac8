// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the secure channel client

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// `User-Agent` sent on every request
pub const USER_AGENT: &str = concat!("securechannel-client/", env!("CARGO_PKG_VERSION"));

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "p256-ecdh-handshake",
    "hmac-client-auth",
    "aes-256-gcm-sessions",
    "session-expiry-detection",
    "connectivity-probe",
    "plaintext-bypass-mode",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Secure Channel Client {}", VERSION_NUMBER)
}

/// Get full version info as JSON
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "userAgent": USER_AGENT,
        "features": FEATURES,
    })
}
