// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prevention-action log operations.
//!
//! The log is append-only. The dispatcher consults it before acting, which
//! is what makes dispatch idempotent across re-fired timers and sweep
//! re-arms.

use arrivo_core::ArrivoError;
use arrivo_core::types::{EscalationTier, PreventionAction, PreventionActionLogEntry};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::queries::text_enum;

/// Append an action entry to the log.
pub async fn append_action(
    db: &Database,
    entry: &PreventionActionLogEntry,
) -> Result<(), ArrivoError> {
    let entry = entry.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO prevention_actions (id, booking_id, message_id, action, tier, \
                 risk_score, metadata, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    entry.id,
                    entry.booking_id,
                    entry.message_id,
                    entry.action.to_string(),
                    entry.tier.to_string(),
                    entry.risk_score_at_time as i64,
                    entry.metadata,
                    entry.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Whether an action of this kind was already logged for the message within
/// the given escalation tier.
pub async fn action_exists(
    db: &Database,
    message_id: &str,
    action: PreventionAction,
    tier: EscalationTier,
) -> Result<bool, ArrivoError> {
    let message_id = message_id.to_string();
    let action = action.to_string();
    let tier = tier.to_string();
    db.connection()
        .call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM prevention_actions
                 WHERE message_id = ?1 AND action = ?2 AND tier = ?3",
                params![message_id, action, tier],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// The full action log for a booking, oldest first. Audit/analytics read path.
pub async fn log_for_booking(
    db: &Database,
    booking_id: &str,
) -> Result<Vec<PreventionActionLogEntry>, ArrivoError> {
    let booking_id = booking_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, booking_id, message_id, action, tier, risk_score, metadata, \
                 created_at FROM prevention_actions WHERE booking_id = ?1
                 ORDER BY created_at ASC, id ASC",
            )?;
            let rows = stmt.query_map(params![booking_id], |row| {
                Ok(PreventionActionLogEntry {
                    id: row.get(0)?,
                    booking_id: row.get(1)?,
                    message_id: row.get(2)?,
                    action: text_enum(3, &row.get::<_, String>(3)?)?,
                    tier: text_enum(4, &row.get::<_, String>(4)?)?,
                    risk_score_at_time: row.get::<_, i64>(5)? as u8,
                    metadata: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, action: PreventionAction, tier: EscalationTier) -> PreventionActionLogEntry {
        PreventionActionLogEntry {
            id: id.to_string(),
            booking_id: "book-1".to_string(),
            message_id: "wamid.1".to_string(),
            action,
            tier,
            risk_score_at_time: 75,
            metadata: None,
            created_at: format!("2026-03-01T10:00:0{}.000Z", id.len() % 10),
        }
    }

    #[tokio::test]
    async fn append_and_read_back_in_order() {
        let db = Database::open_in_memory().await.unwrap();

        append_action(
            &db,
            &entry("a1", PreventionAction::GentleReminder, EscalationTier::Reminder),
        )
        .await
        .unwrap();
        append_action(
            &db,
            &entry("a22", PreventionAction::UrgentReminder, EscalationTier::Escalation),
        )
        .await
        .unwrap();

        let log = log_for_booking(&db, "book-1").await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].action, PreventionAction::GentleReminder);
        assert_eq!(log[1].tier, EscalationTier::Escalation);
    }

    #[tokio::test]
    async fn exists_is_scoped_to_action_and_tier() {
        let db = Database::open_in_memory().await.unwrap();
        append_action(
            &db,
            &entry("a1", PreventionAction::GentleReminder, EscalationTier::Reminder),
        )
        .await
        .unwrap();

        assert!(
            action_exists(
                &db,
                "wamid.1",
                PreventionAction::GentleReminder,
                EscalationTier::Reminder
            )
            .await
            .unwrap()
        );
        // Same action in a different tier has not happened.
        assert!(
            !action_exists(
                &db,
                "wamid.1",
                PreventionAction::GentleReminder,
                EscalationTier::Escalation
            )
            .await
            .unwrap()
        );
        // Different action in the same tier has not happened.
        assert!(
            !action_exists(
                &db,
                "wamid.1",
                PreventionAction::UrgentReminder,
                EscalationTier::Reminder
            )
            .await
            .unwrap()
        );
    }

    #[tokio::test]
    async fn empty_log_for_unknown_booking() {
        let db = Database::open_in_memory().await.unwrap();
        let log = log_for_booking(&db, "nope").await.unwrap();
        assert!(log.is_empty());
    }
}
