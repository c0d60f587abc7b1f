// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Escalation scheduling: time-delayed read checks with fire-time re-checks.
//!
//! The decision to act is made at fire time, never at schedule time: every
//! `on_fire` re-reads the tracking record fresh, so a read receipt ingested
//! after scheduling turns the pending check into a silent no-op.
//!
//! Scheduling follows the outbox pattern: the intent row (plus the
//! `follow_up_scheduled` claim) commits locally before the external
//! workflow-scheduler call, and the periodic sweep re-arms rows whose timer
//! never fired. A crash can only delay a reminder, never duplicate it.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;
use tracing::{debug, error, info, warn};

use arrivo_config::model::EscalationConfig;
use arrivo_core::ArrivoError;
use arrivo_core::traits::WorkflowScheduler;
use arrivo_core::types::{EscalationTier, MessageStatus, MessageType, RiskLevel, SchedulePayload};
use arrivo_storage::Database;
use arrivo_storage::queries::outbox::IntentOutcome;
use arrivo_storage::queries::{bookings, outbox, tracking};

use crate::context::build_context;
use crate::dispatch::{ActionDispatcher, DispatchOutcome};
use crate::{gate, risk};

/// Tunables lifted out of [`EscalationConfig`] into chrono durations.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub reminder_delay: Duration,
    pub escalation_delay: Duration,
    pub session_window: Duration,
    pub high_value_threshold: f64,
    pub schedule_retry_max: u32,
}

impl From<&EscalationConfig> for SchedulerSettings {
    fn from(config: &EscalationConfig) -> Self {
        Self {
            reminder_delay: Duration::minutes(config.reminder_delay_mins),
            escalation_delay: Duration::minutes(config.escalation_delay_mins),
            session_window: Duration::hours(config.session_window_hours),
            high_value_threshold: config.high_value_threshold,
            schedule_retry_max: config.schedule_retry_max,
        }
    }
}

/// Result of a scheduling request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// Intent recorded and external timer requested.
    Scheduled,
    /// A check for this message/tier already exists; duplicate timer refused.
    AlreadyScheduled,
    /// Escalation already triggered; the sequence is terminal and no further
    /// tier may be scheduled.
    Terminal,
}

/// Schedules and fires delayed read checks.
pub struct EscalationScheduler {
    db: Database,
    workflow: Arc<dyn WorkflowScheduler>,
    dispatcher: ActionDispatcher,
    settings: SchedulerSettings,
}

impl EscalationScheduler {
    pub fn new(
        db: Database,
        workflow: Arc<dyn WorkflowScheduler>,
        dispatcher: ActionDispatcher,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            db,
            workflow,
            dispatcher,
            settings,
        }
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// Schedule a read check for `message_id` after `delay`.
    ///
    /// No-op success when a check is already scheduled for the tier, or when
    /// the record is terminally escalated.
    pub async fn schedule_read_check(
        &self,
        message_id: &str,
        tier: EscalationTier,
        delay: Duration,
    ) -> Result<ScheduleOutcome, ArrivoError> {
        let due_at = Utc::now() + delay;
        let due_at_iso = due_at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();
        let check_id = uuid::Uuid::new_v4().to_string();

        match outbox::create_intent(&self.db, &check_id, message_id, tier, &due_at_iso).await? {
            IntentOutcome::Unknown => Err(ArrivoError::UnknownMessage {
                message_id: message_id.to_string(),
            }),
            IntentOutcome::AlreadyScheduled => {
                debug!(message_id, %tier, "check already scheduled; duplicate timer refused");
                Ok(ScheduleOutcome::AlreadyScheduled)
            }
            IntentOutcome::Terminal => {
                debug!(message_id, %tier, "escalation already triggered; scheduling refused");
                Ok(ScheduleOutcome::Terminal)
            }
            IntentOutcome::Created => {
                info!(message_id, %tier, due_at = %due_at_iso, check_id, "read check scheduled");
                self.arm_external_timer(
                    due_at,
                    SchedulePayload {
                        check_id,
                        message_id: message_id.to_string(),
                        tier,
                    },
                )
                .await;
                Ok(ScheduleOutcome::Scheduled)
            }
        }
    }

    /// Call the external scheduler with capped exponential backoff.
    ///
    /// Exhaustion is not fatal: the committed intent row is the source of
    /// truth and the sweep re-arms it, so the worst case is a late check.
    async fn arm_external_timer(&self, due_at: chrono::DateTime<Utc>, payload: SchedulePayload) {
        let mut backoff_ms: u64 = 100;
        for attempt in 0..self.settings.schedule_retry_max {
            match self.workflow.schedule_at(due_at, payload.clone()).await {
                Ok(()) => return,
                Err(ArrivoError::Schedule { message, retryable }) if retryable => {
                    warn!(
                        check_id = %payload.check_id,
                        attempt,
                        error = %message,
                        "workflow scheduler unreachable; backing off"
                    );
                    let jitter = rand::thread_rng().gen_range(0..50);
                    tokio::time::sleep(std::time::Duration::from_millis(backoff_ms + jitter))
                        .await;
                    backoff_ms = (backoff_ms * 2).min(5_000);
                }
                Err(e) => {
                    error!(
                        check_id = %payload.check_id,
                        error = %e,
                        "workflow scheduler rejected the request; leaving intent for sweep"
                    );
                    return;
                }
            }
        }
        error!(
            check_id = %payload.check_id,
            message_id = %payload.message_id,
            "workflow scheduler retries exhausted; intent row left for sweep"
        );
    }

    /// Fire a scheduled check: re-read current state, act if still warranted,
    /// and chain the next tier.
    ///
    /// Idempotent against duplicate fires (raced timer + sweep) through the
    /// outbox row status and the dispatcher's action log.
    pub async fn on_fire(&self, check_id: &str) -> Result<(), ArrivoError> {
        let Some(check) = outbox::get_check(&self.db, check_id).await? else {
            warn!(check_id, "fired check has no outbox row");
            return Ok(());
        };
        if !outbox::mark_dispatched(&self.db, check_id).await? {
            debug!(check_id, status = %check.status, "check already closed; fire is a no-op");
            return Ok(());
        }

        // Fresh read; nothing carried from schedule time.
        let Some(record) = tracking::get_tracking(&self.db, &check.message_id).await? else {
            warn!(check_id, message_id = %check.message_id, "tracking record missing at fire time");
            outbox::complete(&self.db, check_id, "cancelled").await?;
            return Ok(());
        };

        // The condition changed after scheduling: abort silently.
        if record.read_at.is_some() || record.status == MessageStatus::Failed {
            debug!(
                check_id,
                message_id = %check.message_id,
                status = %record.status,
                "condition changed since scheduling; aborting check"
            );
            outbox::complete(&self.db, check_id, "cancelled").await?;
            return Ok(());
        }

        let Some((booking, customer)) =
            bookings::booking_with_customer(&self.db, &record.booking_id).await?
        else {
            warn!(check_id, booking_id = %record.booking_id, "booking missing at fire time");
            outbox::complete(&self.db, check_id, "cancelled").await?;
            return Ok(());
        };
        let context = build_context(&booking, &customer)?;

        let now = Utc::now();
        let assessment = risk::score(&context, &record, now);
        tracking::set_risk_score(&self.db, &record.message_id, assessment.score).await?;

        // The gate guards paid customer messages; manager escalation for
        // critical/high does not message the customer and is never gated.
        let would_message_customer =
            matches!(assessment.level, RiskLevel::Low | RiskLevel::Medium);
        if would_message_customer
            && !gate::is_send_allowed(
                &context,
                MessageType::Reminder,
                self.settings.session_window,
                self.settings.high_value_threshold,
                now,
            )
        {
            info!(
                check_id,
                booking_id = %context.booking_id,
                "session window closed and booking not high-value/VIP; tier skipped"
            );
            outbox::complete(&self.db, check_id, "skipped").await?;
            return Ok(());
        }

        let outcome = self
            .dispatcher
            .dispatch(&context, &record, &assessment, check.tier)
            .await?;

        if let DispatchOutcome::SendFailed = outcome {
            // `check.attempts` predates this fire's mark_dispatched: 0 means
            // first failure (retry once via sweep), 1+ means the retry also
            // failed.
            if check.attempts >= 1 {
                // Second consecutive send failure for this check: stop
                // retrying and surface the booking to a human.
                self.dispatcher
                    .escalate_send_failure(&context, &record, &assessment, check.tier)
                    .await?;
                outbox::complete(&self.db, check_id, "completed").await?;
            } else {
                // Leave the row dispatched; the sweep re-arms it once for a
                // single retry.
                warn!(
                    check_id,
                    attempts = check.attempts,
                    "send failed; leaving check open for one retry"
                );
            }
            return Ok(());
        }

        // Chain the next tier while the condition still holds.
        if check.tier == EscalationTier::Reminder {
            let escalated = tracking::get_tracking(&self.db, &check.message_id)
                .await?
                .map(|r| r.escalation_triggered)
                .unwrap_or(true);
            if !escalated {
                self.schedule_read_check(
                    &check.message_id,
                    EscalationTier::Escalation,
                    self.settings.escalation_delay,
                )
                .await?;
            }
        } else {
            // The escalation tier is the end of the sequence: latch the
            // terminal flag so any further scheduling attempt is refused.
            tracking::latch_escalation(&self.db, &check.message_id).await?;
        }

        outbox::complete(&self.db, check_id, "completed").await?;
        Ok(())
    }
}
