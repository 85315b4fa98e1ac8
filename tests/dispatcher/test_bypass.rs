// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Dispatcher without a session and without a server

use serde_json::{json, Value};

use securechannel_client::{ChannelError, SecureClient};

use crate::common::config_for;
use crate::common::mock_server::MockServer;

#[tokio::test]
async fn test_plain_json_without_session() {
    let server = MockServer::start().await;
    let client = SecureClient::new(config_for(&server.base_url)).unwrap();

    let reply: Value = client
        .dispatcher()
        .post("/api/echo", &json!({"debug": true}))
        .await
        .unwrap();

    assert_eq!(reply, json!({"echo": {"debug": true}}));
    let request = &server.requests_to("/api/echo")[0];
    assert_eq!(request.headers["content-type"], "application/json");
    assert!(!request.headers.contains_key("x-session-id"));
    assert_eq!(request.headers["x-client-id"], "web-client");
    assert_eq!(request.body, r#"{"debug":true}"#);
}

#[tokio::test]
async fn test_transport_failure_is_connectivity_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = SecureClient::new(config_for(&format!("http://{}", addr))).unwrap();

    let err = client.dispatcher().get::<Value>("/api/echo").await.unwrap_err();

    assert!(matches!(err, ChannelError::CertificateOrNetwork(_)));
    assert!(err.is_connectivity());
}

#[tokio::test]
async fn test_http_error_without_session() {
    let server = MockServer::start().await;
    let client = SecureClient::new(config_for(&server.base_url)).unwrap();

    let err = client.dispatcher().get::<Value>("/api/fail").await.unwrap_err();
    assert_eq!(err, ChannelError::Http { status: 500 });
}
