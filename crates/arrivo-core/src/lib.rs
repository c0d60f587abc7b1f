// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Arrivo no-show prevention engine.
//!
//! This crate provides the shared error type, domain types, and the trait
//! seams for external collaborators (messaging gateway, workflow scheduler,
//! manager notification channel). All other Arrivo crates depend on it.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ArrivoError;
pub use types::{
    BookingRiskContext, EscalationTier, MessageId, MessageStatus, MessageTrackingRecord,
    MessageType, PreventionAction, RiskAssessment, RiskLevel, StatusEvent,
};

pub use traits::{ManagerNotifier, MessagingGateway, WorkflowScheduler};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_construct() {
        let _config = ArrivoError::Config("test".into());
        let _storage = ArrivoError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _send = ArrivoError::Send {
            message: "test".into(),
            source: None,
        };
        let _schedule = ArrivoError::Schedule {
            message: "test".into(),
            retryable: true,
        };
        let _unknown = ArrivoError::UnknownMessage {
            message_id: "wamid.1".into(),
        };
        let _stale = ArrivoError::StaleTransition {
            message_id: "wamid.1".into(),
            from: MessageStatus::Read,
            to: MessageStatus::Delivered,
        };
        let _sig = ArrivoError::SignatureInvalid;
        let _notify = ArrivoError::Notify {
            message: "test".into(),
        };
        let _internal = ArrivoError::Internal("test".into());
    }

    #[test]
    fn collaborator_traits_are_object_safe() {
        // The engine holds collaborators as Arc<dyn Trait>; this won't
        // compile if any trait loses object safety.
        fn _gateway(_: &dyn MessagingGateway) {}
        fn _scheduler(_: &dyn WorkflowScheduler) {}
        fn _notifier(_: &dyn ManagerNotifier) {}
    }
}
