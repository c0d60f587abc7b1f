// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across the Arrivo workspace.
//!
//! Persisted enums serialize as snake_case TEXT via strum; timestamps are
//! ISO 8601 UTC strings at the storage boundary and `DateTime<Utc>` inside
//! the risk engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier assigned to an outbound message by the messaging gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Delivery lifecycle of an outbound message.
///
/// Transitions only move forward (sent -> delivered -> read) or sideways
/// into `failed`, which is terminal from any state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
    Failed,
}

impl MessageStatus {
    /// Position in the forward-only ordering. `failed` ranks above all
    /// non-terminal states so nothing can move a record out of it.
    pub fn rank(self) -> u8 {
        match self {
            MessageStatus::Sent => 0,
            MessageStatus::Delivered => 1,
            MessageStatus::Read => 2,
            MessageStatus::Failed => 3,
        }
    }
}

/// What kind of outbound message a tracking record belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Confirmation,
    Reminder,
    FollowUp,
    Escalation,
}

/// Discrete no-show risk level derived from the numeric score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// One step in the fixed two-tier escalation sequence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EscalationTier {
    Reminder,
    Escalation,
}

impl EscalationTier {
    /// The tier that follows this one, or `None` at the end of the sequence.
    pub fn next(self) -> Option<EscalationTier> {
        match self {
            EscalationTier::Reminder => Some(EscalationTier::Escalation),
            EscalationTier::Escalation => None,
        }
    }
}

/// A system-initiated intervention aimed at reducing no-show risk.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PreventionAction {
    StandardReminder,
    GentleReminder,
    UrgentReminder,
    ConfirmAttendanceRequest,
    ImmediateCall,
    ManagerIntervention,
    RescheduleIncentive,
}

/// A delivery-status callback emitted by the messaging gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEvent {
    /// Gateway identifier of the message the event refers to.
    pub message_id: String,
    /// The status the gateway reports.
    pub status: MessageStatus,
    /// When the status change occurred, ISO 8601 UTC.
    pub occurred_at: String,
    /// Recipient identifier as reported by the gateway.
    #[serde(default)]
    pub recipient_id: Option<String>,
}

/// One tracking record per outbound confirmation/reminder message.
///
/// Created exactly once when the message is sent; mutated only by the
/// ingestion handler (status, timestamps) and the scheduler/dispatcher
/// (`follow_up_scheduled`, `follow_up_sent_count`, `escalation_triggered`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTrackingRecord {
    pub message_id: String,
    pub conversation_id: String,
    pub booking_id: String,
    pub message_type: MessageType,
    pub status: MessageStatus,
    pub sent_at: String,
    pub delivered_at: Option<String>,
    pub read_at: Option<String>,
    pub follow_up_scheduled: bool,
    pub follow_up_sent_count: i64,
    /// Last computed risk score (0-100).
    pub risk_score: i64,
    /// Latches true on the first manager escalation and never resets.
    pub escalation_triggered: bool,
    pub updated_at: String,
}

/// Customer profile fields that feed the risk model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientProfile {
    pub visit_count: i64,
    pub no_show_count: i64,
    pub is_vip: bool,
}

/// Read-only view composed from booking + customer + service data,
/// assembled fresh for every risk evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRiskContext {
    pub booking_id: String,
    pub customer_id: String,
    /// Customer phone number for outbound reminders.
    pub phone: String,
    pub appointment_time: DateTime<Utc>,
    pub service_name: Option<String>,
    pub service_value: f64,
    pub client: ClientProfile,
    /// Last inbound customer message; anchors the free-form session window.
    pub last_inbound_at: Option<DateTime<Utc>>,
    pub confirmation_read: bool,
}

impl BookingRiskContext {
    /// Hours remaining until the appointment, negative once it has passed.
    pub fn hours_until_appointment(&self, now: DateTime<Utc>) -> f64 {
        (self.appointment_time - now).num_minutes() as f64 / 60.0
    }
}

/// A single named contribution to the risk score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskFactor {
    pub name: &'static str,
    pub points: i32,
}

/// Output of the risk scoring engine.
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    /// Clamped to 0..=100.
    pub score: u8,
    pub level: RiskLevel,
    /// The factors that actually applied, with their signed point values.
    pub factors: Vec<RiskFactor>,
    pub recommended_actions: Vec<PreventionAction>,
}

/// Append-only audit entry for a prevention action taken on a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreventionActionLogEntry {
    pub id: String,
    pub booking_id: String,
    pub message_id: String,
    pub action: PreventionAction,
    pub tier: EscalationTier,
    pub risk_score_at_time: u8,
    pub metadata: Option<String>,
    pub created_at: String,
}

/// An outbound message handed to the messaging gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub phone: String,
    pub body: String,
    /// Whether this is a paid template message (outside the session window).
    pub template: bool,
}

/// Payload carried by a scheduled read-check callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulePayload {
    /// Identifier of the scheduled-check outbox row.
    pub check_id: String,
    pub message_id: String,
    pub tier: EscalationTier,
}

// --- Storage row types ---

/// A customer row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub phone: String,
    pub display_name: Option<String>,
    pub visit_count: i64,
    pub no_show_count: i64,
    pub is_vip: bool,
    pub created_at: String,
}

/// A booking row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub customer_id: String,
    pub conversation_id: String,
    pub appointment_time: String,
    pub service_name: Option<String>,
    pub service_value: f64,
    pub confirmation_read: bool,
    pub last_inbound_at: Option<String>,
    pub created_at: String,
}

/// A row in the crash-safe evaluation task queue.
#[derive(Debug, Clone)]
pub struct EvaluationTask {
    pub id: i64,
    pub payload: String,
    pub status: String,
    pub attempts: i64,
    pub max_attempts: i64,
    pub created_at: String,
    pub updated_at: String,
    pub locked_until: Option<String>,
}

/// A row in the scheduled-check outbox.
#[derive(Debug, Clone)]
pub struct ScheduledCheck {
    pub id: String,
    pub message_id: String,
    pub tier: EscalationTier,
    pub due_at: String,
    pub status: String,
    pub attempts: i64,
    pub created_at: String,
    pub dispatched_at: Option<String>,
    pub completed_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_rank_is_forward_only() {
        assert!(MessageStatus::Sent.rank() < MessageStatus::Delivered.rank());
        assert!(MessageStatus::Delivered.rank() < MessageStatus::Read.rank());
        assert!(MessageStatus::Read.rank() < MessageStatus::Failed.rank());
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            MessageStatus::Sent,
            MessageStatus::Delivered,
            MessageStatus::Read,
            MessageStatus::Failed,
        ] {
            let text = status.to_string();
            assert_eq!(MessageStatus::from_str(&text).unwrap(), status);
        }
        assert_eq!(MessageStatus::Delivered.to_string(), "delivered");
    }

    #[test]
    fn tier_sequence_is_strictly_two_steps() {
        assert_eq!(
            EscalationTier::Reminder.next(),
            Some(EscalationTier::Escalation)
        );
        assert_eq!(EscalationTier::Escalation.next(), None);
    }

    #[test]
    fn risk_levels_are_ordered() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn status_event_deserializes_without_recipient() {
        let json = r#"{"message_id":"wamid.1","status":"delivered","occurred_at":"2026-03-01T10:00:00.000Z"}"#;
        let event: StatusEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.status, MessageStatus::Delivered);
        assert!(event.recipient_id.is_none());
    }

    #[test]
    fn hours_until_appointment_is_signed() {
        let now = DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let ctx = BookingRiskContext {
            booking_id: "b1".into(),
            customer_id: "c1".into(),
            phone: "+15550001111".into(),
            appointment_time: now + chrono::Duration::hours(10),
            service_name: None,
            service_value: 50.0,
            client: ClientProfile {
                visit_count: 0,
                no_show_count: 0,
                is_vip: false,
            },
            last_inbound_at: None,
            confirmation_read: false,
        };
        assert!((ctx.hours_until_appointment(now) - 10.0).abs() < 1e-9);
        assert!(ctx.hours_until_appointment(now + chrono::Duration::hours(11)) < 0.0);
    }
}
