// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Risk-context assembly from storage rows.

use chrono::{DateTime, Utc};

use arrivo_core::ArrivoError;
use arrivo_core::types::{Booking, BookingRiskContext, ClientProfile, Customer};

fn parse_utc(field: &str, value: &str) -> Result<DateTime<Utc>, ArrivoError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ArrivoError::Internal(format!("unparseable {field} timestamp {value:?}: {e}")))
}

/// Compose the read-only risk view from a booking and its customer.
///
/// Built fresh for every evaluation; never cached across a schedule/fire
/// boundary.
pub fn build_context(
    booking: &Booking,
    customer: &Customer,
) -> Result<BookingRiskContext, ArrivoError> {
    let appointment_time = parse_utc("appointment_time", &booking.appointment_time)?;
    let last_inbound_at = booking
        .last_inbound_at
        .as_deref()
        .map(|v| parse_utc("last_inbound_at", v))
        .transpose()?;

    Ok(BookingRiskContext {
        booking_id: booking.id.clone(),
        customer_id: customer.id.clone(),
        phone: customer.phone.clone(),
        appointment_time,
        service_name: booking.service_name.clone(),
        service_value: booking.service_value,
        client: ClientProfile {
            visit_count: customer.visit_count,
            no_show_count: customer.no_show_count,
            is_vip: customer.is_vip,
        },
        last_inbound_at,
        confirmation_read: booking.confirmation_read,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking() -> Booking {
        Booking {
            id: "b1".into(),
            customer_id: "c1".into(),
            conversation_id: "conv-1".into(),
            appointment_time: "2026-03-06T10:00:00.000Z".into(),
            service_name: Some("color".into()),
            service_value: 120.0,
            confirmation_read: false,
            last_inbound_at: Some("2026-03-04T08:00:00.000Z".into()),
            created_at: "2026-03-04T08:00:00.000Z".into(),
        }
    }

    fn customer() -> Customer {
        Customer {
            id: "c1".into(),
            phone: "+15550001111".into(),
            display_name: Some("Dana".into()),
            visit_count: 4,
            no_show_count: 1,
            is_vip: true,
            created_at: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn assembles_all_fields() {
        let ctx = build_context(&booking(), &customer()).unwrap();
        assert_eq!(ctx.booking_id, "b1");
        assert_eq!(ctx.phone, "+15550001111");
        assert_eq!(ctx.client.visit_count, 4);
        assert_eq!(ctx.client.no_show_count, 1);
        assert!(ctx.client.is_vip);
        assert!(ctx.last_inbound_at.is_some());
        assert_eq!(ctx.appointment_time.to_rfc3339(), "2026-03-06T10:00:00+00:00");
    }

    #[test]
    fn missing_inbound_anchor_is_fine() {
        let mut b = booking();
        b.last_inbound_at = None;
        let ctx = build_context(&b, &customer()).unwrap();
        assert!(ctx.last_inbound_at.is_none());
    }

    #[test]
    fn garbage_timestamp_is_an_error() {
        let mut b = booking();
        b.appointment_time = "next tuesday".into();
        let err = build_context(&b, &customer()).unwrap_err();
        assert!(err.to_string().contains("appointment_time"));
    }
}
