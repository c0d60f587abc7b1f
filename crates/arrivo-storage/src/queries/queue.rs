// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Evaluation queue operations.
//!
//! Status ingestion enqueues a re-evaluation task here instead of scoring
//! inline, so the webhook ACK never waits on risk computation. The worker
//! drains the queue with crash-safe dequeue/ack/fail semantics.

use arrivo_core::ArrivoError;
use arrivo_core::types::EvaluationTask;
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Enqueue a new evaluation task. Returns the auto-generated task ID.
pub async fn enqueue(db: &Database, payload: &str) -> Result<i64, ArrivoError> {
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO evaluation_queue (payload) VALUES (?1)",
                params![payload],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Dequeue the next pending task.
///
/// Atomically selects the oldest pending entry and marks it as "processing"
/// with a 5-minute lock timeout. Returns `None` if the queue is empty.
pub async fn dequeue(db: &Database) -> Result<Option<EvaluationTask>, ArrivoError> {
    db.connection()
        .call(move |conn| {
            // Use a transaction to atomically find + update the next pending entry.
            let tx = conn.transaction()?;

            let result = {
                let mut stmt = tx.prepare(
                    "SELECT id, payload, status, attempts, max_attempts,
                            created_at, updated_at, locked_until
                     FROM evaluation_queue
                     WHERE status = 'pending'
                     ORDER BY id ASC
                     LIMIT 1",
                )?;
                stmt.query_row([], |row| {
                    Ok(EvaluationTask {
                        id: row.get(0)?,
                        payload: row.get(1)?,
                        status: row.get(2)?,
                        attempts: row.get(3)?,
                        max_attempts: row.get(4)?,
                        created_at: row.get(5)?,
                        updated_at: row.get(6)?,
                        locked_until: row.get(7)?,
                    })
                })
            };

            match result {
                Ok(task) => {
                    tx.execute(
                        "UPDATE evaluation_queue SET status = 'processing',
                         locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '+5 minutes'),
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                         WHERE id = ?1",
                        params![task.id],
                    )?;
                    tx.commit()?;

                    Ok(Some(EvaluationTask {
                        status: "processing".to_string(),
                        ..task
                    }))
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    tx.commit()?;
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Acknowledge successful processing of a task. Marks it "completed".
pub async fn ack(db: &Database, id: i64) -> Result<(), ArrivoError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE evaluation_queue SET status = 'completed',
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Mark a task as failed.
///
/// Increments attempts. If attempts >= max_attempts, sets status to "failed".
/// Otherwise resets to "pending" for retry and clears the lock.
pub async fn fail(db: &Database, id: i64) -> Result<(), ArrivoError> {
    db.connection()
        .call(move |conn| {
            let (attempts, max_attempts): (i64, i64) = conn.query_row(
                "SELECT attempts, max_attempts FROM evaluation_queue WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let new_attempts = attempts + 1;
            let new_status = if new_attempts >= max_attempts {
                "failed"
            } else {
                "pending"
            };
            conn.execute(
                "UPDATE evaluation_queue SET status = ?1, attempts = ?2,
                 locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?3",
                params![new_status, new_attempts, id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enqueue_and_dequeue_lifecycle() {
        let db = Database::open_in_memory().await.unwrap();

        let id = enqueue(&db, r#"{"message_id":"wamid.1"}"#).await.unwrap();
        assert!(id > 0);

        let task = dequeue(&db).await.unwrap().unwrap();
        assert_eq!(task.id, id);
        assert_eq!(task.status, "processing");
        assert_eq!(task.payload, r#"{"message_id":"wamid.1"}"#);

        // Queue should be empty now (no more pending).
        assert!(dequeue(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ack_marks_completed() {
        let db = Database::open_in_memory().await.unwrap();

        let id = enqueue(&db, "payload").await.unwrap();
        let _task = dequeue(&db).await.unwrap().unwrap();
        ack(&db, id).await.unwrap();

        let status: String = db
            .connection()
            .call(move |conn| -> Result<String, rusqlite::Error> {
                conn.query_row(
                    "SELECT status FROM evaluation_queue WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(status, "completed");
    }

    #[tokio::test]
    async fn fail_retries_until_max_attempts() {
        let db = Database::open_in_memory().await.unwrap();
        let id = enqueue(&db, "payload").await.unwrap();

        // Default max_attempts is 3; first two failures go back to pending.
        for expected_attempts in 1..=2 {
            let _task = dequeue(&db).await.unwrap().unwrap();
            fail(&db, id).await.unwrap();

            let (status, attempts): (String, i64) = db
                .connection()
                .call(move |conn| -> Result<(String, i64), rusqlite::Error> {
                    conn.query_row(
                        "SELECT status, attempts FROM evaluation_queue WHERE id = ?1",
                        params![id],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                })
                .await
                .unwrap();
            assert_eq!(status, "pending");
            assert_eq!(attempts, expected_attempts);
        }

        // Third failure is permanent.
        let _task = dequeue(&db).await.unwrap().unwrap();
        fail(&db, id).await.unwrap();

        let status: String = db
            .connection()
            .call(move |conn| -> Result<String, rusqlite::Error> {
                conn.query_row(
                    "SELECT status FROM evaluation_queue WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();
        assert_eq!(status, "failed");
        assert!(dequeue(&db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dequeue_empty_queue_returns_none() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(dequeue(&db).await.unwrap().is_none());
    }
}
