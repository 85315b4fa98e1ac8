// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-process secure-channel server for integration tests
//!
//! Implements the server half of the handshake with p256 + aes-gcm and an
//! echo endpoint that decrypts the request and encrypts `{"echo": <body>}`.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use p256::{
    ecdh::EphemeralSecret,
    pkcs8::{DecodePublicKey, EncodePublicKey},
    PublicKey,
};
use rand::{rngs::OsRng, RngCore};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SESSION_ID: &str = "abc";
pub const INITIATE_PATH: &str = "/api/security/initiate-handshake";
pub const COMPLETE_PATH: &str = "/api/security/complete-handshake";
pub const SLOW_ECHO_DELAY: Duration = Duration::from_millis(300);

/// How the mock server should misbehave
#[derive(Debug, Clone)]
pub struct Behavior {
    pub initiate_status: u16,
    /// Replaces the normal initiate body when set
    pub initiate_body: Option<Value>,
    pub initiate_delay: Duration,
    pub complete_status: u16,
    /// Echo replies with a plaintext `{"status":"error"}` body
    pub expire_sessions: bool,
    /// Session ids handed out in order; falls back to `SESSION_ID`
    pub session_ids: Vec<String>,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            initiate_status: 200,
            initiate_body: None,
            initiate_delay: Duration::ZERO,
            complete_status: 200,
            expire_sessions: false,
            session_ids: Vec::new(),
        }
    }
}

/// One request as seen by the server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub headers: HeaderMap,
    pub body: String,
}

#[derive(Default)]
pub struct ServerState {
    behavior: Mutex<Behavior>,
    pending_secret: Mutex<Option<EphemeralSecret>>,
    session_key: Mutex<Option<Aes256Gcm>>,
    requests: Mutex<Vec<RecordedRequest>>,
    pub initiate_calls: AtomicUsize,
    pub complete_calls: AtomicUsize,
}

impl ServerState {
    fn record(&self, path: &str, headers: &HeaderMap, body: &str) {
        self.requests.lock().unwrap().push(RecordedRequest {
            path: path.to_string(),
            headers: headers.clone(),
            body: body.to_string(),
        });
    }

    fn behavior(&self) -> Behavior {
        self.behavior.lock().unwrap().clone()
    }

    fn next_session_id(&self) -> String {
        let mut behavior = self.behavior.lock().unwrap();
        if behavior.session_ids.is_empty() {
            SESSION_ID.to_string()
        } else {
            behavior.session_ids.remove(0)
        }
    }
}

pub struct MockServer {
    pub base_url: String,
    pub state: Arc<ServerState>,
}

impl MockServer {
    pub async fn start() -> Self {
        Self::start_with(Behavior::default()).await
    }

    pub async fn start_with(behavior: Behavior) -> Self {
        let state = Arc::new(ServerState {
            behavior: Mutex::new(behavior),
            ..ServerState::default()
        });

        let app = Router::new()
            .route(INITIATE_PATH, get(initiate))
            .route(COMPLETE_PATH, post(complete))
            .route("/api/echo", post(echo))
            .route("/api/slow_echo", post(slow_echo))
            .route("/api/fail", get(fail))
            .route("/api/empty", post(empty))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.state.behavior.lock().unwrap() = behavior;
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    pub fn has_session_key(&self) -> bool {
        self.state.session_key.lock().unwrap().is_some()
    }

    /// Encrypt with the server's copy of the session key
    pub fn seal(&self, plaintext: &str) -> String {
        let cipher = self.state.session_key.lock().unwrap().clone().unwrap();
        seal_with(&cipher, plaintext.as_bytes())
    }

    /// Decrypt with the server's copy of the session key
    pub fn open(&self, envelope: &str) -> Option<String> {
        let cipher = self.state.session_key.lock().unwrap().clone()?;
        open_with(&cipher, envelope)
    }
}

/// A valid base64 SPKI P-256 public key
pub fn random_spki() -> String {
    let secret = EphemeralSecret::random(&mut OsRng);
    STANDARD.encode(secret.public_key().to_public_key_der().unwrap().as_bytes())
}

fn seal_with(cipher: &Aes256Gcm, plaintext: &[u8]) -> String {
    let mut iv = [0u8; 12];
    OsRng.fill_bytes(&mut iv);
    let mut out = iv.to_vec();
    out.extend(cipher.encrypt(Nonce::from_slice(&iv), plaintext).unwrap());
    STANDARD.encode(out)
}

fn open_with(cipher: &Aes256Gcm, envelope: &str) -> Option<String> {
    let raw = STANDARD.decode(envelope.trim()).ok()?;
    if raw.len() <= 12 {
        return None;
    }
    let (iv, ciphertext) = raw.split_at(12);
    let plain = cipher.decrypt(Nonce::from_slice(iv), ciphertext).ok()?;
    String::from_utf8(plain).ok()
}

async fn initiate(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    state.initiate_calls.fetch_add(1, Ordering::SeqCst);
    state.record(INITIATE_PATH, &headers, "");
    let behavior = state.behavior();

    if !behavior.initiate_delay.is_zero() {
        tokio::time::sleep(behavior.initiate_delay).await;
    }

    if behavior.initiate_status != 200 {
        let status = StatusCode::from_u16(behavior.initiate_status).unwrap();
        return (status, Json(json!({"status": "error", "error": "initiate failed"}))).into_response();
    }

    if let Some(body) = behavior.initiate_body {
        return Json(body).into_response();
    }

    let secret = EphemeralSecret::random(&mut OsRng);
    let spki = STANDARD.encode(secret.public_key().to_public_key_der().unwrap().as_bytes());
    *state.pending_secret.lock().unwrap() = Some(secret);

    Json(json!({
        "sessionId": state.next_session_id(),
        "serverPublicKey": spki,
    }))
    .into_response()
}

async fn complete(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.complete_calls.fetch_add(1, Ordering::SeqCst);
    state.record(COMPLETE_PATH, &headers, &body.to_string());
    let behavior = state.behavior();

    if behavior.complete_status != 200 {
        return StatusCode::from_u16(behavior.complete_status)
            .unwrap()
            .into_response();
    }

    let Some(secret) = state.pending_secret.lock().unwrap().take() else {
        return StatusCode::CONFLICT.into_response();
    };
    let Some(client_key) = body["clientPublicKey"].as_str() else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let Ok(der) = STANDARD.decode(client_key) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let Ok(client_public) = PublicKey::from_public_key_der(&der) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let shared = secret.diffie_hellman(&client_public);
    let digest = Sha256::digest(shared.raw_secret_bytes());
    let cipher = Aes256Gcm::new_from_slice(&digest).unwrap();
    *state.session_key.lock().unwrap() = Some(cipher);

    Json(json!({"status": "ok"})).into_response()
}

async fn echo(State(state): State<Arc<ServerState>>, headers: HeaderMap, body: String) -> Response {
    state.record("/api/echo", &headers, &body);

    if state.behavior().expire_sessions {
        return Json(json!({"status": "error", "error": "Session expired"})).into_response();
    }

    let cipher = state.session_key.lock().unwrap().clone();
    match cipher {
        Some(cipher) if headers.contains_key("x-session-id") => {
            let Some(plain) = open_with(&cipher, &body) else {
                return Json(json!({"status": "error", "error": "cannot decrypt"})).into_response();
            };
            let value: Value = serde_json::from_str(&plain).unwrap_or(Value::Null);
            let reply = json!({ "echo": value }).to_string();
            seal_with(&cipher, reply.as_bytes()).into_response()
        }
        _ => {
            let value: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
            Json(json!({ "echo": value })).into_response()
        }
    }
}

/// Echo sealed under the key current on arrival, after `SLOW_ECHO_DELAY`
async fn slow_echo(State(state): State<Arc<ServerState>>, headers: HeaderMap, body: String) -> Response {
    state.record("/api/slow_echo", &headers, &body);
    let captured = state.session_key.lock().unwrap().clone();
    let Some(cipher) = captured else {
        return StatusCode::CONFLICT.into_response();
    };

    tokio::time::sleep(SLOW_ECHO_DELAY).await;

    let Some(plain) = open_with(&cipher, &body) else {
        return Json(json!({"status": "error", "error": "cannot decrypt"})).into_response();
    };
    let value: Value = serde_json::from_str(&plain).unwrap_or(Value::Null);
    seal_with(&cipher, json!({ "echo": value }).to_string().as_bytes()).into_response()
}

async fn fail(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    state.record("/api/fail", &headers, "");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"status": "error", "error": "boom"})),
    )
        .into_response()
}

async fn empty(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    state.record("/api/empty", &headers, "");
    StatusCode::NO_CONTENT.into_response()
}
