// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Channel shared across tasks

use securechannel_client::{SecureChannel, SharedSecret};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_encrypt_decrypt() {
    let channel = Arc::new(SecureChannel::new());
    channel
        .establish("abc", SharedSecret::from_bytes(&[9; 32]))
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..32 {
        let channel = channel.clone();
        handles.push(tokio::spawn(async move {
            let plaintext = format!(r#"{{"task":{}}}"#, i);
            let sealed = channel.encrypt(&plaintext).unwrap();
            tokio::task::yield_now().await;
            assert_eq!(channel.decrypt(&sealed).unwrap(), plaintext);
            sealed
        }));
    }

    let mut envelopes = Vec::new();
    for handle in handles {
        envelopes.push(handle.await.unwrap());
    }
    envelopes.sort();
    envelopes.dedup();
    assert_eq!(envelopes.len(), 32);
    assert!(channel.is_initialized());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_invalidate_while_in_use() {
    let channel = Arc::new(SecureChannel::new());
    channel
        .establish("abc", SharedSecret::from_bytes(&[9; 32]))
        .unwrap();

    let worker = {
        let channel = channel.clone();
        tokio::spawn(async move {
            // Each call sees either a full session or none at all
            for _ in 0..200 {
                if let Ok(sealed) = channel.encrypt("x") {
                    let _ = channel.decrypt(&sealed);
                }
                tokio::task::yield_now().await;
            }
        })
    };

    channel.invalidate();
    worker.await.unwrap();
    assert!(!channel.is_initialized());
}
