// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message tracking record operations.
//!
//! Status transitions are applied inside a single transaction on the single
//! writer thread: the read-decide-write sequence is the compare-and-swap
//! that keeps the forward-only status invariant under concurrent and
//! out-of-order webhook deliveries.

use arrivo_core::ArrivoError;
use arrivo_core::types::{MessageStatus, MessageTrackingRecord, MessageType, StatusEvent};
use rusqlite::params;

use crate::database::{Database, map_tr_err, now_iso};
use crate::queries::text_enum;

/// Result of applying a status event to a tracking record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The event moved the record forward.
    Applied {
        from: MessageStatus,
        to: MessageStatus,
        /// A `read` event arrived before `delivered`; both timestamps were
        /// set from this event.
        collapsed: bool,
    },
    /// The exact status was already recorded; re-delivery of the same event.
    Duplicate,
    /// The event would move the record backward; stored state wins.
    Stale { current: MessageStatus },
    /// No tracking record exists for the message id.
    Unknown,
}

const RECORD_COLUMNS: &str = "message_id, conversation_id, booking_id, message_type, status, \
     sent_at, delivered_at, read_at, follow_up_scheduled, follow_up_sent_count, \
     risk_score, escalation_triggered, updated_at";

fn record_from_row(row: &rusqlite::Row<'_>) -> Result<MessageTrackingRecord, rusqlite::Error> {
    Ok(MessageTrackingRecord {
        message_id: row.get(0)?,
        conversation_id: row.get(1)?,
        booking_id: row.get(2)?,
        message_type: text_enum::<MessageType>(3, &row.get::<_, String>(3)?)?,
        status: text_enum::<MessageStatus>(4, &row.get::<_, String>(4)?)?,
        sent_at: row.get(5)?,
        delivered_at: row.get(6)?,
        read_at: row.get(7)?,
        follow_up_scheduled: row.get(8)?,
        follow_up_sent_count: row.get(9)?,
        risk_score: row.get(10)?,
        escalation_triggered: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

/// Insert a new tracking record. Called exactly once, when the message is sent.
pub async fn create_tracking(
    db: &Database,
    record: &MessageTrackingRecord,
) -> Result<(), ArrivoError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO message_tracking (message_id, conversation_id, booking_id, \
                 message_type, status, sent_at, delivered_at, read_at, follow_up_scheduled, \
                 follow_up_sent_count, risk_score, escalation_triggered, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    record.message_id,
                    record.conversation_id,
                    record.booking_id,
                    record.message_type.to_string(),
                    record.status.to_string(),
                    record.sent_at,
                    record.delivered_at,
                    record.read_at,
                    record.follow_up_scheduled,
                    record.follow_up_sent_count,
                    record.risk_score,
                    record.escalation_triggered,
                    record.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a tracking record by gateway message id.
pub async fn get_tracking(
    db: &Database,
    message_id: &str,
) -> Result<Option<MessageTrackingRecord>, ArrivoError> {
    let message_id = message_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM message_tracking WHERE message_id = ?1"
            ))?;
            match stmt.query_row(params![message_id], record_from_row) {
                Ok(record) => Ok(Some(record)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Apply a delivery-status event with compare-and-swap semantics.
///
/// The whole read-decide-write runs in one transaction on the writer thread,
/// so duplicate or out-of-order webhook deliveries cannot corrupt the
/// forward-only invariant. A `read` arriving before `delivered` collapses
/// into delivered+read with both timestamps taken from the event.
pub async fn apply_status_transition(
    db: &Database,
    event: &StatusEvent,
) -> Result<TransitionOutcome, ArrivoError> {
    let event = event.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let current: Option<String> = {
                let mut stmt = tx.prepare(
                    "SELECT status FROM message_tracking WHERE message_id = ?1",
                )?;
                match stmt.query_row(params![event.message_id], |row| row.get(0)) {
                    Ok(status) => Some(status),
                    Err(rusqlite::Error::QueryReturnedNoRows) => None,
                    Err(e) => return Err(e),
                }
            };

            let Some(current) = current else {
                tx.commit()?;
                return Ok(TransitionOutcome::Unknown);
            };
            let current: MessageStatus = text_enum(0, &current)?;
            let now = now_iso();

            let outcome = match (current, event.status) {
                (from, to) if from == to => TransitionOutcome::Duplicate,

                // Terminal failure is reachable from any non-failed state.
                (from, MessageStatus::Failed) => {
                    tx.execute(
                        "UPDATE message_tracking SET status = 'failed', updated_at = ?2
                         WHERE message_id = ?1",
                        params![event.message_id, now],
                    )?;
                    TransitionOutcome::Applied {
                        from,
                        to: MessageStatus::Failed,
                        collapsed: false,
                    }
                }

                (MessageStatus::Sent, MessageStatus::Delivered) => {
                    tx.execute(
                        "UPDATE message_tracking SET status = 'delivered',
                         delivered_at = COALESCE(delivered_at, ?2), updated_at = ?3
                         WHERE message_id = ?1",
                        params![event.message_id, event.occurred_at, now],
                    )?;
                    TransitionOutcome::Applied {
                        from: MessageStatus::Sent,
                        to: MessageStatus::Delivered,
                        collapsed: false,
                    }
                }

                (MessageStatus::Delivered, MessageStatus::Read) => {
                    tx.execute(
                        "UPDATE message_tracking SET status = 'read',
                         read_at = COALESCE(read_at, ?2), updated_at = ?3
                         WHERE message_id = ?1",
                        params![event.message_id, event.occurred_at, now],
                    )?;
                    TransitionOutcome::Applied {
                        from: MessageStatus::Delivered,
                        to: MessageStatus::Read,
                        collapsed: false,
                    }
                }

                // Read receipt outran the delivery receipt: collapse both.
                (MessageStatus::Sent, MessageStatus::Read) => {
                    tx.execute(
                        "UPDATE message_tracking SET status = 'read',
                         delivered_at = COALESCE(delivered_at, ?2),
                         read_at = COALESCE(read_at, ?2), updated_at = ?3
                         WHERE message_id = ?1",
                        params![event.message_id, event.occurred_at, now],
                    )?;
                    TransitionOutcome::Applied {
                        from: MessageStatus::Sent,
                        to: MessageStatus::Read,
                        collapsed: true,
                    }
                }

                // Everything else moves backward; stored state wins.
                (from, _) => TransitionOutcome::Stale { current: from },
            };

            tx.commit()?;
            Ok(outcome)
        })
        .await
        .map_err(map_tr_err)
}

/// Latch `escalation_triggered` true. Returns whether this call won the
/// latch; a `false` return means another dispatch already escalated and the
/// caller must treat its own escalation as a no-op.
pub async fn latch_escalation(db: &Database, message_id: &str) -> Result<bool, ArrivoError> {
    let message_id = message_id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE message_tracking SET escalation_triggered = 1, updated_at = ?2
                 WHERE message_id = ?1 AND escalation_triggered = 0",
                params![message_id, now_iso()],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Increment the follow-up counter after a reminder was actually sent.
pub async fn increment_follow_up_sent(
    db: &Database,
    message_id: &str,
) -> Result<(), ArrivoError> {
    let message_id = message_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE message_tracking
                 SET follow_up_sent_count = follow_up_sent_count + 1, updated_at = ?2
                 WHERE message_id = ?1",
                params![message_id, now_iso()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Persist the last computed risk score.
pub async fn set_risk_score(
    db: &Database,
    message_id: &str,
    score: u8,
) -> Result<(), ArrivoError> {
    let message_id = message_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE message_tracking SET risk_score = ?2, updated_at = ?3
                 WHERE message_id = ?1",
                params![message_id, score as i64, now_iso()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::bookings::{create_booking, create_customer};
    use arrivo_core::types::{Booking, Customer};

    async fn setup_db() -> Database {
        let db = Database::open_in_memory().await.unwrap();
        let customer = Customer {
            id: "cust-1".to_string(),
            phone: "+15550001111".to_string(),
            display_name: Some("Dana".to_string()),
            visit_count: 0,
            no_show_count: 0,
            is_vip: false,
            created_at: "2026-03-01T09:00:00.000Z".to_string(),
        };
        create_customer(&db, &customer).await.unwrap();
        let booking = Booking {
            id: "book-1".to_string(),
            customer_id: "cust-1".to_string(),
            conversation_id: "conv-1".to_string(),
            appointment_time: "2026-03-02T10:00:00.000Z".to_string(),
            service_name: Some("consultation".to_string()),
            service_value: 50.0,
            confirmation_read: false,
            last_inbound_at: Some("2026-03-01T09:00:00.000Z".to_string()),
            created_at: "2026-03-01T09:00:00.000Z".to_string(),
        };
        create_booking(&db, &booking).await.unwrap();
        db
    }

    fn confirmation_record(message_id: &str) -> MessageTrackingRecord {
        MessageTrackingRecord {
            message_id: message_id.to_string(),
            conversation_id: "conv-1".to_string(),
            booking_id: "book-1".to_string(),
            message_type: MessageType::Confirmation,
            status: MessageStatus::Sent,
            sent_at: "2026-03-01T10:00:00.000Z".to_string(),
            delivered_at: None,
            read_at: None,
            follow_up_scheduled: false,
            follow_up_sent_count: 0,
            risk_score: 0,
            escalation_triggered: false,
            updated_at: "2026-03-01T10:00:00.000Z".to_string(),
        }
    }

    fn event(message_id: &str, status: MessageStatus, at: &str) -> StatusEvent {
        StatusEvent {
            message_id: message_id.to_string(),
            status,
            occurred_at: at.to_string(),
            recipient_id: None,
        }
    }

    #[tokio::test]
    async fn delivered_then_read_moves_forward() {
        let db = setup_db().await;
        create_tracking(&db, &confirmation_record("wamid.1"))
            .await
            .unwrap();

        let out = apply_status_transition(
            &db,
            &event("wamid.1", MessageStatus::Delivered, "2026-03-01T10:01:00.000Z"),
        )
        .await
        .unwrap();
        assert_eq!(
            out,
            TransitionOutcome::Applied {
                from: MessageStatus::Sent,
                to: MessageStatus::Delivered,
                collapsed: false,
            }
        );

        let out = apply_status_transition(
            &db,
            &event("wamid.1", MessageStatus::Read, "2026-03-01T10:05:00.000Z"),
        )
        .await
        .unwrap();
        assert_eq!(
            out,
            TransitionOutcome::Applied {
                from: MessageStatus::Delivered,
                to: MessageStatus::Read,
                collapsed: false,
            }
        );

        let record = get_tracking(&db, "wamid.1").await.unwrap().unwrap();
        assert_eq!(record.status, MessageStatus::Read);
        assert_eq!(record.delivered_at.as_deref(), Some("2026-03-01T10:01:00.000Z"));
        assert_eq!(record.read_at.as_deref(), Some("2026-03-01T10:05:00.000Z"));
    }

    #[tokio::test]
    async fn duplicate_event_is_noop() {
        let db = setup_db().await;
        create_tracking(&db, &confirmation_record("wamid.1"))
            .await
            .unwrap();

        apply_status_transition(
            &db,
            &event("wamid.1", MessageStatus::Delivered, "2026-03-01T10:01:00.000Z"),
        )
        .await
        .unwrap();

        // Webhook redelivery of the same event.
        let out = apply_status_transition(
            &db,
            &event("wamid.1", MessageStatus::Delivered, "2026-03-01T10:02:00.000Z"),
        )
        .await
        .unwrap();
        assert_eq!(out, TransitionOutcome::Duplicate);

        // Stored timestamp untouched.
        let record = get_tracking(&db, "wamid.1").await.unwrap().unwrap();
        assert_eq!(record.delivered_at.as_deref(), Some("2026-03-01T10:01:00.000Z"));
    }

    #[tokio::test]
    async fn read_before_delivered_collapses() {
        let db = setup_db().await;
        create_tracking(&db, &confirmation_record("wamid.1"))
            .await
            .unwrap();

        let out = apply_status_transition(
            &db,
            &event("wamid.1", MessageStatus::Read, "2026-03-01T10:03:00.000Z"),
        )
        .await
        .unwrap();
        assert_eq!(
            out,
            TransitionOutcome::Applied {
                from: MessageStatus::Sent,
                to: MessageStatus::Read,
                collapsed: true,
            }
        );

        // Invariant: read_at implies delivered_at is set and <= read_at.
        let record = get_tracking(&db, "wamid.1").await.unwrap().unwrap();
        assert_eq!(record.status, MessageStatus::Read);
        assert_eq!(record.delivered_at, record.read_at);
    }

    #[tokio::test]
    async fn delivered_after_read_is_stale() {
        let db = setup_db().await;
        create_tracking(&db, &confirmation_record("wamid.1"))
            .await
            .unwrap();

        apply_status_transition(
            &db,
            &event("wamid.1", MessageStatus::Read, "2026-03-01T10:03:00.000Z"),
        )
        .await
        .unwrap();

        let out = apply_status_transition(
            &db,
            &event("wamid.1", MessageStatus::Delivered, "2026-03-01T10:01:00.000Z"),
        )
        .await
        .unwrap();
        assert_eq!(
            out,
            TransitionOutcome::Stale {
                current: MessageStatus::Read
            }
        );

        let record = get_tracking(&db, "wamid.1").await.unwrap().unwrap();
        assert_eq!(record.status, MessageStatus::Read);
    }

    #[tokio::test]
    async fn failed_is_terminal() {
        let db = setup_db().await;
        create_tracking(&db, &confirmation_record("wamid.1"))
            .await
            .unwrap();

        let out = apply_status_transition(
            &db,
            &event("wamid.1", MessageStatus::Failed, "2026-03-01T10:01:00.000Z"),
        )
        .await
        .unwrap();
        assert!(matches!(out, TransitionOutcome::Applied { to: MessageStatus::Failed, .. }));

        let out = apply_status_transition(
            &db,
            &event("wamid.1", MessageStatus::Delivered, "2026-03-01T10:02:00.000Z"),
        )
        .await
        .unwrap();
        assert_eq!(
            out,
            TransitionOutcome::Stale {
                current: MessageStatus::Failed
            }
        );
    }

    #[tokio::test]
    async fn unknown_message_reported() {
        let db = setup_db().await;
        let out = apply_status_transition(
            &db,
            &event("wamid.ghost", MessageStatus::Delivered, "2026-03-01T10:01:00.000Z"),
        )
        .await
        .unwrap();
        assert_eq!(out, TransitionOutcome::Unknown);
    }

    #[tokio::test]
    async fn escalation_latch_fires_once() {
        let db = setup_db().await;
        create_tracking(&db, &confirmation_record("wamid.1"))
            .await
            .unwrap();

        assert!(latch_escalation(&db, "wamid.1").await.unwrap());
        // Second latch attempt loses.
        assert!(!latch_escalation(&db, "wamid.1").await.unwrap());

        let record = get_tracking(&db, "wamid.1").await.unwrap().unwrap();
        assert!(record.escalation_triggered);
    }

    #[tokio::test]
    async fn follow_up_counter_and_score_persist() {
        let db = setup_db().await;
        create_tracking(&db, &confirmation_record("wamid.1"))
            .await
            .unwrap();

        increment_follow_up_sent(&db, "wamid.1").await.unwrap();
        increment_follow_up_sent(&db, "wamid.1").await.unwrap();
        set_risk_score(&db, "wamid.1", 75).await.unwrap();

        let record = get_tracking(&db, "wamid.1").await.unwrap().unwrap();
        assert_eq!(record.follow_up_sent_count, 2);
        assert_eq!(record.risk_score, 75);
    }
}
