// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Fire-and-forget message queue behind a capability trait.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

/// Outbound queue capability. Delivery is at-most-once from this component's
/// perspective; callers log failures instead of retrying.
#[async_trait]
pub trait Queue: Send + Sync {
    async fn send(&self, message: &Value) -> Result<()>;
}

/// Queue implementation that POSTs messages as JSON to a webhook endpoint
pub struct WebhookQueue {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookQueue {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Queue for WebhookQueue {
    async fn send(&self, message: &Value) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(message)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to send queue message: {}", e))?;

        response
            .error_for_status()
            .map_err(|e| anyhow!("Queue endpoint rejected message: {}", e))?;
        Ok(())
    }
}

/// In-memory queue for tests; records every message it is sent
#[derive(Default)]
pub struct MemoryQueue {
    messages: Mutex<Vec<Value>>,
    fail_sends: std::sync::atomic::AtomicBool,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Value> {
        self.messages.lock().unwrap().clone()
    }

    pub fn fail_sends(&self) {
        self.fail_sends
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl Queue for MemoryQueue {
    async fn send(&self, message: &Value) -> Result<()> {
        if self.fail_sends.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(anyhow!("injected queue failure"));
        }
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }
}
