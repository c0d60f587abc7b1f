// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock workflow scheduler for deterministic testing.
//!
//! Records every scheduling request instead of arming real timers; tests
//! fire checks explicitly by calling the engine's `on_fire` with a recorded
//! payload. Can be scripted to fail to exercise backoff/outbox recovery.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use arrivo_core::ArrivoError;
use arrivo_core::traits::WorkflowScheduler;
use arrivo_core::types::SchedulePayload;

/// One recorded scheduling request.
#[derive(Debug, Clone)]
pub struct RecordedSchedule {
    pub due_at: DateTime<Utc>,
    pub payload: SchedulePayload,
}

/// A mock workflow scheduler for testing.
pub struct MockScheduler {
    recorded: Arc<Mutex<Vec<RecordedSchedule>>>,
    fail_remaining: Arc<Mutex<u32>>,
    fail_retryable: Arc<Mutex<bool>>,
}

impl MockScheduler {
    /// Create a new mock scheduler that accepts every request.
    pub fn new() -> Self {
        Self {
            recorded: Arc::new(Mutex::new(Vec::new())),
            fail_remaining: Arc::new(Mutex::new(0)),
            fail_retryable: Arc::new(Mutex::new(true)),
        }
    }

    /// Make the next `n` schedule calls fail; `retryable` selects between
    /// transient unreachability and permanent rejection.
    pub async fn fail_next(&self, n: u32, retryable: bool) {
        *self.fail_remaining.lock().await = n;
        *self.fail_retryable.lock().await = retryable;
    }

    /// All recorded scheduling requests, in order.
    pub async fn recorded(&self) -> Vec<RecordedSchedule> {
        self.recorded.lock().await.clone()
    }

    /// Count of recorded scheduling requests.
    pub async fn recorded_count(&self) -> usize {
        self.recorded.lock().await.len()
    }

    /// The most recent request, if any.
    pub async fn last(&self) -> Option<RecordedSchedule> {
        self.recorded.lock().await.last().cloned()
    }
}

impl Default for MockScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkflowScheduler for MockScheduler {
    async fn schedule_at(
        &self,
        due_at: DateTime<Utc>,
        payload: SchedulePayload,
    ) -> Result<(), ArrivoError> {
        {
            let mut remaining = self.fail_remaining.lock().await;
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ArrivoError::Schedule {
                    message: "mock scheduler scripted failure".to_string(),
                    retryable: *self.fail_retryable.lock().await,
                });
            }
        }
        self.recorded
            .lock()
            .await
            .push(RecordedSchedule { due_at, payload });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrivo_core::types::EscalationTier;

    fn payload(check_id: &str) -> SchedulePayload {
        SchedulePayload {
            check_id: check_id.to_string(),
            message_id: "wamid.1".to_string(),
            tier: EscalationTier::Reminder,
        }
    }

    #[tokio::test]
    async fn records_requests_in_order() {
        let scheduler = MockScheduler::new();
        scheduler
            .schedule_at(Utc::now(), payload("chk-1"))
            .await
            .unwrap();
        scheduler
            .schedule_at(Utc::now(), payload("chk-2"))
            .await
            .unwrap();

        let recorded = scheduler.recorded().await;
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].payload.check_id, "chk-1");
        assert_eq!(scheduler.last().await.unwrap().payload.check_id, "chk-2");
    }

    #[tokio::test]
    async fn scripted_failures_carry_retryable_flag() {
        let scheduler = MockScheduler::new();
        scheduler.fail_next(1, true).await;

        let err = scheduler
            .schedule_at(Utc::now(), payload("chk-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ArrivoError::Schedule { retryable: true, .. }));

        // Subsequent call succeeds and is recorded.
        scheduler
            .schedule_at(Utc::now(), payload("chk-2"))
            .await
            .unwrap();
        assert_eq!(scheduler.recorded_count().await, 1);
    }
}
