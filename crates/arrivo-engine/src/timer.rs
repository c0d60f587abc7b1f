// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process implementation of the workflow-scheduler trait.
//!
//! Each schedule call spawns a tokio sleep that delivers the payload into a
//! channel; the serve loop receives payloads and calls the escalation
//! scheduler's `on_fire`. Deployments with a durable external scheduler
//! swap this out behind the same trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::warn;

use arrivo_core::ArrivoError;
use arrivo_core::traits::WorkflowScheduler;
use arrivo_core::types::SchedulePayload;

/// Tokio-timer-backed workflow scheduler.
///
/// Not durable across restarts by itself — the scheduled-check outbox plus
/// the sweep provide durability; this only provides timeliness.
pub struct TimerScheduler {
    tx: mpsc::Sender<SchedulePayload>,
}

impl TimerScheduler {
    /// `tx` is the fire channel consumed by the serve loop.
    pub fn new(tx: mpsc::Sender<SchedulePayload>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl WorkflowScheduler for TimerScheduler {
    async fn schedule_at(
        &self,
        due_at: DateTime<Utc>,
        payload: SchedulePayload,
    ) -> Result<(), ArrivoError> {
        let tx = self.tx.clone();
        let delay = (due_at - Utc::now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(payload).await.is_err() {
                warn!("fire channel closed; timer payload dropped");
            }
        });
        Ok(())
    }
}
