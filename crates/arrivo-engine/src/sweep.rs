// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbox sweep: reconciliation for scheduled checks whose external timer
//! never fired (crash between commit and schedule call, lost scheduler, or
//! a fire that died mid-flight).
//!
//! Re-arming goes through `on_fire`, which re-checks everything, so a sweep
//! racing a late timer is harmless.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use arrivo_core::ArrivoError;
use arrivo_storage::Database;
use arrivo_storage::queries::outbox;

use crate::scheduler::EscalationScheduler;

/// Upper bound on fire attempts per check; beyond this the row is left for
/// operator inspection rather than re-armed forever.
const MAX_FIRE_ATTEMPTS: i64 = 5;

/// Periodic reconciliation task for the scheduled-check outbox.
pub struct OutboxSweep {
    db: Database,
    scheduler: Arc<EscalationScheduler>,
    interval: std::time::Duration,
    grace: Duration,
    cancel: CancellationToken,
}

impl OutboxSweep {
    pub fn new(
        db: Database,
        scheduler: Arc<EscalationScheduler>,
        interval: std::time::Duration,
        grace: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            db,
            scheduler,
            interval,
            grace,
            cancel,
        }
    }

    /// Run until cancelled.
    pub async fn run(&self) {
        info!(
            interval_secs = self.interval.as_secs(),
            grace_mins = self.grace.num_minutes(),
            "outbox sweep started"
        );
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("outbox sweep stopping");
                    return;
                }
                _ = tokio::time::sleep(self.interval) => {
                    if let Err(e) = self.sweep_once().await {
                        warn!(error = %e, "sweep cycle failed");
                    }
                }
            }
        }
    }

    /// One reconciliation pass. Exposed for deterministic tests.
    pub async fn sweep_once(&self) -> Result<usize, ArrivoError> {
        let cutoff = (Utc::now() - self.grace)
            .format("%Y-%m-%dT%H:%M:%S%.3fZ")
            .to_string();
        let candidates = outbox::sweep_candidates(&self.db, &cutoff, MAX_FIRE_ATTEMPTS).await?;
        let count = candidates.len();

        for check in candidates {
            info!(
                check_id = %check.id,
                message_id = %check.message_id,
                tier = %check.tier,
                due_at = %check.due_at,
                attempts = check.attempts,
                "re-arming overdue check"
            );
            if let Err(e) = self.scheduler.on_fire(&check.id).await {
                warn!(check_id = %check.id, error = %e, "re-armed check failed");
            }
        }
        Ok(count)
    }
}
