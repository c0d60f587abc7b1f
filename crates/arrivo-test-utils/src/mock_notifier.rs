// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock manager notifier for deterministic testing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use arrivo_core::ArrivoError;
use arrivo_core::traits::ManagerNotifier;
use arrivo_core::types::{BookingRiskContext, RiskAssessment};

/// One captured manager notification.
#[derive(Debug, Clone)]
pub struct RecordedNotification {
    pub booking_id: String,
    pub score: u8,
}

/// A mock notification channel for testing.
pub struct MockNotifier {
    notified: Arc<Mutex<Vec<RecordedNotification>>>,
    fail_all: Arc<Mutex<bool>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            notified: Arc::new(Mutex::new(Vec::new())),
            fail_all: Arc::new(Mutex::new(false)),
        }
    }

    /// Make every notification fail, to verify best-effort handling.
    pub async fn fail_all(&self, fail: bool) {
        *self.fail_all.lock().await = fail;
    }

    /// All captured notifications.
    pub async fn notifications(&self) -> Vec<RecordedNotification> {
        self.notified.lock().await.clone()
    }

    /// Count of captured notifications.
    pub async fn notified_count(&self) -> usize {
        self.notified.lock().await.len()
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ManagerNotifier for MockNotifier {
    async fn notify_manager(
        &self,
        booking: &BookingRiskContext,
        assessment: &RiskAssessment,
    ) -> Result<(), ArrivoError> {
        if *self.fail_all.lock().await {
            return Err(ArrivoError::Notify {
                message: "mock notifier scripted failure".to_string(),
            });
        }
        self.notified.lock().await.push(RecordedNotification {
            booking_id: booking.booking_id.clone(),
            score: assessment.score,
        });
        Ok(())
    }
}
