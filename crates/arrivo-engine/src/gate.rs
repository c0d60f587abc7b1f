// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cost/consent gate for paid outbound messages.
//!
//! Inside the free-form session window every send is allowed. Outside it a
//! message must be a paid template, which is only justified for high-value
//! bookings or VIP customers. A gate refusal is a deliberate skip, not a
//! failure.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use arrivo_core::types::{BookingRiskContext, MessageType};

/// Whether the free-form messaging session window is still open.
///
/// The window is anchored on the last inbound customer message; a booking
/// with no inbound traffic has no open window.
pub fn session_window_open(
    context: &BookingRiskContext,
    window: Duration,
    now: DateTime<Utc>,
) -> bool {
    match context.last_inbound_at {
        Some(anchor) => now - anchor <= window,
        None => false,
    }
}

/// Decide whether sending `message_type` to this booking is allowed right now.
pub fn is_send_allowed(
    context: &BookingRiskContext,
    message_type: MessageType,
    window: Duration,
    high_value_threshold: f64,
    now: DateTime<Utc>,
) -> bool {
    if session_window_open(context, window, now) {
        return true;
    }

    let allowed = context.service_value > high_value_threshold || context.client.is_vip;
    debug!(
        booking_id = %context.booking_id,
        %message_type,
        service_value = context.service_value,
        is_vip = context.client.is_vip,
        allowed,
        "session window closed; template send gate decision"
    );
    allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrivo_core::types::ClientProfile;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn context(
        service_value: f64,
        is_vip: bool,
        last_inbound_at: Option<&str>,
    ) -> BookingRiskContext {
        BookingRiskContext {
            booking_id: "b1".into(),
            customer_id: "c1".into(),
            phone: "+15550001111".into(),
            appointment_time: utc("2026-03-06T10:00:00Z"),
            service_name: None,
            service_value,
            client: ClientProfile {
                visit_count: 2,
                no_show_count: 0,
                is_vip,
            },
            last_inbound_at: last_inbound_at.map(utc),
            confirmation_read: false,
        }
    }

    fn window() -> Duration {
        Duration::hours(24)
    }

    #[test]
    fn open_window_allows_anything() {
        let now = utc("2026-03-05T10:00:00Z");
        let ctx = context(10.0, false, Some("2026-03-05T00:00:00Z"));
        assert!(session_window_open(&ctx, window(), now));
        assert!(is_send_allowed(&ctx, MessageType::Reminder, window(), 100.0, now));
    }

    #[test]
    fn closed_window_blocks_low_value_non_vip() {
        let now = utc("2026-03-05T10:00:00Z");
        let ctx = context(50.0, false, Some("2026-03-03T00:00:00Z"));
        assert!(!session_window_open(&ctx, window(), now));
        assert!(!is_send_allowed(&ctx, MessageType::Reminder, window(), 100.0, now));
    }

    #[test]
    fn closed_window_allows_high_value() {
        let now = utc("2026-03-05T10:00:00Z");
        let ctx = context(150.0, false, Some("2026-03-03T00:00:00Z"));
        assert!(is_send_allowed(&ctx, MessageType::Reminder, window(), 100.0, now));
    }

    #[test]
    fn closed_window_allows_vip() {
        let now = utc("2026-03-05T10:00:00Z");
        let ctx = context(20.0, true, Some("2026-03-03T00:00:00Z"));
        assert!(is_send_allowed(&ctx, MessageType::FollowUp, window(), 100.0, now));
    }

    #[test]
    fn no_inbound_traffic_means_no_window() {
        let now = utc("2026-03-05T10:00:00Z");
        let ctx = context(50.0, false, None);
        assert!(!session_window_open(&ctx, window(), now));
        assert!(!is_send_allowed(&ctx, MessageType::Reminder, window(), 100.0, now));
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let now = utc("2026-03-05T00:00:00Z");
        let ctx = context(50.0, false, Some("2026-03-04T00:00:00Z"));
        assert!(session_window_open(&ctx, window(), now));
    }

    #[test]
    fn value_at_threshold_is_not_enough() {
        // Strictly greater-than: exactly 100 does not qualify.
        let now = utc("2026-03-05T10:00:00Z");
        let ctx = context(100.0, false, None);
        assert!(!is_send_allowed(&ctx, MessageType::Reminder, window(), 100.0, now));
    }
}
