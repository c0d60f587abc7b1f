// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Status ingestion: idempotent state transitions for gateway callbacks.
//!
//! The handler applies the compare-and-swap transition, then enqueues a
//! re-evaluation task instead of scoring inline — the webhook ACK never
//! waits on risk computation or outbound sends.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use arrivo_core::ArrivoError;
use arrivo_core::types::{MessageStatus, MessageType, StatusEvent};
use arrivo_storage::Database;
use arrivo_storage::queries::tracking::TransitionOutcome;
use arrivo_storage::queries::{bookings, outbox, queue, tracking};

/// Why a re-evaluation task was enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalReason {
    /// Confirmation reached the device; score and maybe schedule a check.
    Delivered,
    /// Confirmation was read; de-risk so pending checks become no-ops.
    Read,
}

/// Queue payload linking a task back to its tracking record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalPayload {
    pub message_id: String,
    pub reason: EvalReason,
}

/// Applies gateway delivery-status callbacks to tracking records.
pub struct StatusIngestor {
    db: Database,
}

impl StatusIngestor {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Ingest one status event.
    ///
    /// Returns [`ArrivoError::UnknownMessage`] / [`ArrivoError::StaleTransition`]
    /// for events that are deliberate no-ops; callers at the webhook boundary
    /// log these and still acknowledge the delivery. Duplicate re-delivery of
    /// an already-recorded status is silently idempotent.
    pub async fn ingest(&self, event: &StatusEvent) -> Result<(), ArrivoError> {
        match tracking::apply_status_transition(&self.db, event).await? {
            TransitionOutcome::Unknown => Err(ArrivoError::UnknownMessage {
                message_id: event.message_id.clone(),
            }),
            TransitionOutcome::Stale { current } => Err(ArrivoError::StaleTransition {
                message_id: event.message_id.clone(),
                from: current,
                to: event.status,
            }),
            TransitionOutcome::Duplicate => {
                debug!(
                    message_id = %event.message_id,
                    status = %event.status,
                    "duplicate status event ignored"
                );
                Ok(())
            }
            TransitionOutcome::Applied {
                from,
                to,
                collapsed,
            } => {
                info!(
                    message_id = %event.message_id,
                    old_status = %from,
                    new_status = %to,
                    occurred_at = %event.occurred_at,
                    collapsed,
                    "status transition accepted"
                );
                self.after_transition(event, to).await
            }
        }
    }

    /// Side effects of an accepted transition. Kept off the CAS write path.
    async fn after_transition(
        &self,
        event: &StatusEvent,
        new_status: MessageStatus,
    ) -> Result<(), ArrivoError> {
        let Some(record) = tracking::get_tracking(&self.db, &event.message_id).await? else {
            // Record vanished between transition and follow-up; nothing to do.
            warn!(message_id = %event.message_id, "tracking record missing after transition");
            return Ok(());
        };

        match new_status {
            MessageStatus::Delivered => {
                if record.message_type == MessageType::Confirmation {
                    self.enqueue_evaluation(&event.message_id, EvalReason::Delivered)
                        .await?;
                }
            }
            MessageStatus::Read => {
                if record.message_type == MessageType::Confirmation {
                    bookings::set_confirmation_read(&self.db, &record.booking_id).await?;
                }
                // Best-effort cancellation; the fire-time re-read stays
                // authoritative for any check this misses.
                let cancelled =
                    outbox::cancel_open_for_message(&self.db, &event.message_id).await?;
                if cancelled > 0 {
                    info!(
                        message_id = %event.message_id,
                        booking_id = %record.booking_id,
                        cancelled,
                        "read receipt cancelled pending checks"
                    );
                }
                self.enqueue_evaluation(&event.message_id, EvalReason::Read)
                    .await?;
            }
            MessageStatus::Failed => {
                warn!(
                    message_id = %event.message_id,
                    booking_id = %record.booking_id,
                    "message delivery failed; record is terminal"
                );
            }
            MessageStatus::Sent => {}
        }
        Ok(())
    }

    async fn enqueue_evaluation(
        &self,
        message_id: &str,
        reason: EvalReason,
    ) -> Result<(), ArrivoError> {
        let payload = EvalPayload {
            message_id: message_id.to_string(),
            reason,
        };
        let json = serde_json::to_string(&payload)
            .map_err(|e| ArrivoError::Internal(format!("eval payload encode: {e}")))?;
        let task_id = queue::enqueue(&self.db, &json).await?;
        debug!(message_id, task_id, ?reason, "evaluation task enqueued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_payload_round_trips() {
        let payload = EvalPayload {
            message_id: "wamid.1".into(),
            reason: EvalReason::Read,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"read\""));
        let back: EvalPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back.message_id, "wamid.1");
        assert_eq!(back.reason, EvalReason::Read);
    }
}
