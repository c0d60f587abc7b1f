// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock messaging gateway for deterministic testing.
//!
//! `MockGateway` captures outbound messages for assertion and can be
//! scripted to fail a number of sends to exercise retry paths.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use arrivo_core::ArrivoError;
use arrivo_core::traits::MessagingGateway;
use arrivo_core::types::{MessageId, OutboundMessage};

/// A mock messaging gateway for testing.
pub struct MockGateway {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    fail_remaining: Arc<Mutex<u32>>,
}

impl MockGateway {
    /// Create a new mock gateway that succeeds every send.
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_remaining: Arc::new(Mutex::new(0)),
        }
    }

    /// Make the next `n` sends fail with a gateway error.
    pub async fn fail_next(&self, n: u32) {
        *self.fail_remaining.lock().await = n;
    }

    /// All messages that were sent successfully.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    /// Count of successfully sent messages.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Clear captured messages.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagingGateway for MockGateway {
    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, ArrivoError> {
        {
            let mut remaining = self.fail_remaining.lock().await;
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ArrivoError::Send {
                    message: "mock gateway scripted failure".to_string(),
                    source: None,
                });
            }
        }
        let id = format!("mock-msg-{}", uuid::Uuid::new_v4());
        self.sent.lock().await.push(msg);
        Ok(MessageId(id))
    }
}
