// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use arrivo_core::ArrivoError;

use crate::migrations;

/// Convert a tokio-rusqlite error into `ArrivoError::Storage`.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> ArrivoError {
    ArrivoError::Storage {
        source: Box::new(e),
    }
}

/// Current time as the ISO 8601 string format used throughout the schema.
pub fn now_iso() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// Handle to the single-writer SQLite database.
///
/// Cloning is cheap; all clones share the one background write thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path`, apply PRAGMAs,
    /// and run all pending migrations.
    pub async fn open(path: &str) -> Result<Self, ArrivoError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| ArrivoError::Storage {
                source: Box::new(e),
            })?;
        Self::initialize(conn, true).await
    }

    /// Open an in-memory database with migrations applied. Test use only —
    /// the data vanishes when the connection closes.
    pub async fn open_in_memory() -> Result<Self, ArrivoError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| ArrivoError::Storage {
                source: Box::new(e),
            })?;
        // WAL is meaningless for :memory:; skip it.
        Self::initialize(conn, false).await
    }

    async fn initialize(
        conn: tokio_rusqlite::Connection,
        wal_mode: bool,
    ) -> Result<Self, ArrivoError> {
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")?;
            }
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "busy_timeout", 5000)?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(|conn| migrations::run_migrations(conn))
            .await
            .map_err(|e| ArrivoError::Storage {
                source: Box::new(e),
            })?;

        tracing::debug!("database initialized");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection. Query modules call through
    /// this; the background thread serializes every closure.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Close the database, flushing pending writes.
    pub async fn close(self) -> Result<(), ArrivoError> {
        self.conn.close().await.map_err(|e| ArrivoError::Storage {
            source: Box::new(e),
        })
    }
}
