// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Workflow scheduler trait for time-delayed callback execution.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ArrivoError;
use crate::types::SchedulePayload;

/// The external workflow scheduler that invokes a callback at or after a
/// requested time.
///
/// Scheduling calls are fire-and-forget from the engine's perspective; the
/// persisted scheduled-check outbox row is the local source of truth, and a
/// periodic sweep reconciles rows whose external timer never fired.
#[async_trait]
pub trait WorkflowScheduler: Send + Sync {
    /// Request that `payload` be delivered back to the engine at or after
    /// `due_at`. A transient failure should be reported as
    /// [`ArrivoError::Schedule`] with `retryable: true`.
    async fn schedule_at(
        &self,
        due_at: DateTime<Utc>,
        payload: SchedulePayload,
    ) -> Result<(), ArrivoError>;
}
