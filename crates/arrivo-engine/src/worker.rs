// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Evaluation worker: drains the evaluation queue, scores risk, and arms
//! the reminder tier when the risk warrants it.
//!
//! Runs as a background task under a cancellation token. Task failures go
//! back to the queue with bounded attempts (crash-safe dequeue/ack/fail).

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use arrivo_core::ArrivoError;
use arrivo_core::types::{EscalationTier, EvaluationTask, MessageStatus, MessageType, RiskLevel};
use arrivo_storage::Database;
use arrivo_storage::queries::{bookings, queue, tracking};

use crate::context::build_context;
use crate::ingest::EvalPayload;
use crate::risk;
use crate::scheduler::EscalationScheduler;

/// Background worker that turns queued evaluation tasks into risk scores
/// and scheduled read checks.
pub struct EvaluationWorker {
    db: Database,
    scheduler: Arc<EscalationScheduler>,
    poll_interval: std::time::Duration,
    cancel: CancellationToken,
}

impl EvaluationWorker {
    pub fn new(
        db: Database,
        scheduler: Arc<EscalationScheduler>,
        poll_interval: std::time::Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            db,
            scheduler,
            poll_interval,
            cancel,
        }
    }

    /// Run until cancelled. Each cycle drains every pending task.
    pub async fn run(&self) {
        info!(poll_secs = self.poll_interval.as_secs(), "evaluation worker started");
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("evaluation worker stopping");
                    return;
                }
                _ = tokio::time::sleep(self.poll_interval) => {
                    if let Err(e) = self.drain().await {
                        warn!(error = %e, "evaluation drain cycle failed");
                    }
                }
            }
        }
    }

    /// Drain all pending tasks once. Exposed for deterministic tests.
    pub async fn drain(&self) -> Result<(), ArrivoError> {
        while let Some(task) = queue::dequeue(&self.db).await? {
            match self.process(&task).await {
                Ok(()) => queue::ack(&self.db, task.id).await?,
                Err(e) => {
                    warn!(task_id = task.id, error = %e, "evaluation task failed");
                    queue::fail(&self.db, task.id).await?;
                }
            }
        }
        Ok(())
    }

    async fn process(&self, task: &EvaluationTask) -> Result<(), ArrivoError> {
        let payload: EvalPayload = serde_json::from_str(&task.payload)
            .map_err(|e| ArrivoError::Internal(format!("eval payload decode: {e}")))?;

        let Some(record) = tracking::get_tracking(&self.db, &payload.message_id).await? else {
            warn!(message_id = %payload.message_id, "evaluation task for unknown record; dropping");
            return Ok(());
        };
        let Some((booking, customer)) =
            bookings::booking_with_customer(&self.db, &record.booking_id).await?
        else {
            warn!(booking_id = %record.booking_id, "evaluation task for unknown booking; dropping");
            return Ok(());
        };
        let context = build_context(&booking, &customer)?;

        let assessment = risk::score(&context, &record, Utc::now());
        tracking::set_risk_score(&self.db, &record.message_id, assessment.score).await?;
        debug!(
            message_id = %record.message_id,
            booking_id = %record.booking_id,
            reason = ?payload.reason,
            score = assessment.score,
            level = %assessment.level,
            "risk evaluated"
        );

        // A read (or failed) record de-risks: nothing to schedule, and any
        // pending check aborts itself at fire time.
        let still_unread =
            record.read_at.is_none() && record.status != MessageStatus::Failed;
        if still_unread
            && record.message_type == MessageType::Confirmation
            && assessment.level >= RiskLevel::Medium
        {
            self.scheduler
                .schedule_read_check(
                    &record.message_id,
                    EscalationTier::Reminder,
                    self.scheduler.settings().reminder_delay,
                )
                .await?;
        }
        Ok(())
    }
}
