// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seeded-database harness for integration tests.
//!
//! Opens a tempfile-backed database (migrations applied) and provides
//! seeding helpers for customers, bookings, and tracking records with
//! test-friendly defaults.

use arrivo_core::types::{
    Booking, Customer, MessageStatus, MessageTrackingRecord, MessageType,
};
use arrivo_storage::Database;
use arrivo_storage::queries::{bookings, tracking};

/// A tempfile-backed database that lives as long as the harness.
pub struct TestDb {
    pub db: Database,
    _dir: tempfile::TempDir,
}

impl TestDb {
    /// Open a fresh database in a temp directory.
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("arrivo-test.db");
        let db = Database::open(path.to_str().expect("utf8 path"))
            .await
            .expect("open test database");
        Self { db, _dir: dir }
    }
}

/// A customer with low-risk defaults; override fields as needed.
pub fn customer(id: &str) -> Customer {
    Customer {
        id: id.to_string(),
        phone: "+15550001111".to_string(),
        display_name: Some("Dana".to_string()),
        visit_count: 2,
        no_show_count: 0,
        is_vip: false,
        created_at: "2026-03-01T09:00:00.000Z".to_string(),
    }
}

/// A booking with defaults; `appointment_time` and `last_inbound_at` are the
/// knobs most tests turn.
pub fn booking(id: &str, customer_id: &str, appointment_time: &str) -> Booking {
    Booking {
        id: id.to_string(),
        customer_id: customer_id.to_string(),
        conversation_id: format!("conv-{id}"),
        appointment_time: appointment_time.to_string(),
        service_name: Some("consultation".to_string()),
        service_value: 50.0,
        confirmation_read: false,
        last_inbound_at: Some("2026-03-01T09:00:00.000Z".to_string()),
        created_at: "2026-03-01T09:00:00.000Z".to_string(),
    }
}

/// A freshly-sent confirmation tracking record.
pub fn confirmation(message_id: &str, booking_id: &str) -> MessageTrackingRecord {
    MessageTrackingRecord {
        message_id: message_id.to_string(),
        conversation_id: format!("conv-{booking_id}"),
        booking_id: booking_id.to_string(),
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

/// Seed a customer, booking, and confirmation record in one go.
pub async fn seed_booking_with_confirmation(
    db: &Database,
    customer_row: &Customer,
    booking_row: &Booking,
    record: &MessageTrackingRecord,
) {
    bookings::create_customer(db, customer_row)
        .await
        .expect("seed customer");
    bookings::create_booking(db, booking_row)
        .await
        .expect("seed booking");
    tracking::create_tracking(db, record)
        .await
        .expect("seed tracking record");
}
