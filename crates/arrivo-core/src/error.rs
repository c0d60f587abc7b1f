// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Arrivo no-show prevention engine.

use thiserror::Error;

use crate::types::MessageStatus;

/// The primary error type used across all Arrivo crates.
#[derive(Debug, Error)]
pub enum ArrivoError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Outbound send through the messaging gateway failed.
    ///
    /// The affected escalation tier stays eligible for one retry on the next
    /// natural schedule check; counters are not advanced on this error.
    #[error("gateway send failed: {message}")]
    Send {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The external workflow scheduler rejected or failed a scheduling call.
    ///
    /// `retryable` distinguishes transient unreachability (retried with
    /// backoff) from permanent validation failures.
    #[error("schedule failed: {message}")]
    Schedule { message: String, retryable: bool },

    /// A status event referenced a message with no tracking record.
    /// Logged and dropped at the ingress boundary; never retried.
    #[error("unknown message: {message_id}")]
    UnknownMessage { message_id: String },

    /// A status event would move a tracking record backward.
    /// Logged and dropped; the stored state is already ahead of the event.
    #[error("stale transition for {message_id}: {from} -> {to}")]
    StaleTransition {
        message_id: String,
        from: MessageStatus,
        to: MessageStatus,
    },

    /// Webhook request carried a missing or invalid signature.
    /// Rejected at the boundary; never reaches the ingestion handler.
    #[error("webhook signature invalid")]
    SignatureInvalid,

    /// Manager notification channel failure. Best-effort: logged, not propagated.
    #[error("manager notification failed: {message}")]
    Notify { message: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ArrivoError {
    /// Whether this error is an expected no-op at the ingestion boundary
    /// (the webhook still acknowledges the event with a 2xx).
    pub fn is_ingest_noop(&self) -> bool {
        matches!(
            self,
            ArrivoError::UnknownMessage { .. } | ArrivoError::StaleTransition { .. }
        )
    }
}
