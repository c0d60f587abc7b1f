// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled-check outbox operations.
//!
//! A read-check is recorded here *before* the external workflow scheduler is
//! called: the intent row and the `follow_up_scheduled` claim commit in one
//! transaction, so a crash between commit and the external call leaves a
//! pending row the sweep can re-arm. Failure degrades toward a late
//! reminder, never a duplicate one.

use arrivo_core::ArrivoError;
use arrivo_core::types::{EscalationTier, ScheduledCheck};
use rusqlite::params;

use crate::database::{Database, map_tr_err, now_iso};
use crate::queries::text_enum;

/// Result of recording a scheduling intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    /// Intent row created; the caller should now arm the external timer.
    Created,
    /// A check for this message/tier is already pending; duplicate timer
    /// prevented.
    AlreadyScheduled,
    /// Escalation already triggered for this record; no further tier may be
    /// scheduled.
    Terminal,
    /// No tracking record exists for the message id.
    Unknown,
}

const CHECK_COLUMNS: &str =
    "id, message_id, tier, due_at, status, attempts, created_at, dispatched_at, completed_at";

fn check_from_row(row: &rusqlite::Row<'_>) -> Result<ScheduledCheck, rusqlite::Error> {
    Ok(ScheduledCheck {
        id: row.get(0)?,
        message_id: row.get(1)?,
        tier: text_enum::<EscalationTier>(2, &row.get::<_, String>(2)?)?,
        due_at: row.get(3)?,
        status: row.get(4)?,
        attempts: row.get(5)?,
        created_at: row.get(6)?,
        dispatched_at: row.get(7)?,
        completed_at: row.get(8)?,
    })
}

/// Record the intent to run a read check for `message_id` at `due_at`.
///
/// For the reminder tier this claims `follow_up_scheduled` (compare-and-swap:
/// a record that already holds the flag yields `AlreadyScheduled`). For the
/// escalation tier it refuses terminally-escalated records and dedupes on an
/// existing open check row. Claim and insert commit atomically.
pub async fn create_intent(
    db: &Database,
    check_id: &str,
    message_id: &str,
    tier: EscalationTier,
    due_at: &str,
) -> Result<IntentOutcome, ArrivoError> {
    let check_id = check_id.to_string();
    let message_id = message_id.to_string();
    let due_at = due_at.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let flags: Option<(bool, bool)> = {
                let mut stmt = tx.prepare(
                    "SELECT follow_up_scheduled, escalation_triggered
                     FROM message_tracking WHERE message_id = ?1",
                )?;
                match stmt.query_row(params![message_id], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                }) {
                    Ok(pair) => Some(pair),
                    Err(rusqlite::Error::QueryReturnedNoRows) => None,
                    Err(e) => return Err(e),
                }
            };

            let Some((follow_up_scheduled, escalation_triggered)) = flags else {
                tx.commit()?;
                return Ok(IntentOutcome::Unknown);
            };

            if escalation_triggered {
                tx.commit()?;
                return Ok(IntentOutcome::Terminal);
            }

            match tier {
                EscalationTier::Reminder => {
                    if follow_up_scheduled {
                        tx.commit()?;
                        return Ok(IntentOutcome::AlreadyScheduled);
                    }
                    tx.execute(
                        "UPDATE message_tracking SET follow_up_scheduled = 1, updated_at = ?2
                         WHERE message_id = ?1",
                        params![message_id, now_iso()],
                    )?;
                }
                EscalationTier::Escalation => {
                    let open: i64 = tx.query_row(
                        "SELECT COUNT(*) FROM scheduled_checks
                         WHERE message_id = ?1 AND tier = 'escalation'
                           AND status IN ('pending', 'dispatched')",
                        params![message_id],
                        |row| row.get(0),
                    )?;
                    if open > 0 {
                        tx.commit()?;
                        return Ok(IntentOutcome::AlreadyScheduled);
                    }
                }
            }

            tx.execute(
                "INSERT INTO scheduled_checks (id, message_id, tier, due_at, status, attempts)
                 VALUES (?1, ?2, ?3, ?4, 'pending', 0)",
                params![check_id, message_id, tier.to_string(), due_at],
            )?;
            tx.commit()?;
            Ok(IntentOutcome::Created)
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a scheduled check by id.
pub async fn get_check(
    db: &Database,
    check_id: &str,
) -> Result<Option<ScheduledCheck>, ArrivoError> {
    let check_id = check_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CHECK_COLUMNS} FROM scheduled_checks WHERE id = ?1"
            ))?;
            match stmt.query_row(params![check_id], check_from_row) {
                Ok(check) => Ok(Some(check)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Claim a check for firing. Returns `false` when the row is already
/// completed or cancelled — a raced duplicate fire must become a no-op.
pub async fn mark_dispatched(db: &Database, check_id: &str) -> Result<bool, ArrivoError> {
    let check_id = check_id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE scheduled_checks SET status = 'dispatched',
                 attempts = attempts + 1, dispatched_at = ?2
                 WHERE id = ?1 AND status IN ('pending', 'dispatched')",
                params![check_id, now_iso()],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Close a check with a final status (`completed` or `cancelled`).
pub async fn complete(db: &Database, check_id: &str, final_status: &str) -> Result<(), ArrivoError> {
    let check_id = check_id.to_string();
    let final_status = final_status.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE scheduled_checks SET status = ?2, completed_at = ?3
                 WHERE id = ?1",
                params![check_id, final_status, now_iso()],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Cancel all open checks for a message. Best-effort de-risk path when a
/// read receipt arrives; the fire-time re-read stays authoritative.
pub async fn cancel_open_for_message(
    db: &Database,
    message_id: &str,
) -> Result<usize, ArrivoError> {
    let message_id = message_id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE scheduled_checks SET status = 'cancelled', completed_at = ?2
                 WHERE message_id = ?1 AND status IN ('pending', 'dispatched')",
                params![message_id, now_iso()],
            )?;
            Ok(changed)
        })
        .await
        .map_err(map_tr_err)
}

/// Open checks whose due time passed before `cutoff` and that have attempts
/// left: `pending` rows whose external timer was never armed or never fired,
/// and `dispatched` rows whose firing crashed mid-flight.
pub async fn sweep_candidates(
    db: &Database,
    cutoff: &str,
    max_attempts: i64,
) -> Result<Vec<ScheduledCheck>, ArrivoError> {
    let cutoff = cutoff.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CHECK_COLUMNS} FROM scheduled_checks
                 WHERE status IN ('pending', 'dispatched')
                   AND due_at <= ?1 AND attempts < ?2
                 ORDER BY due_at ASC"
            ))?;
            let rows = stmt.query_map(params![cutoff, max_attempts], check_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
