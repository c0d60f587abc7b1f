// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Confirmation send tests: the tracking record's birth.

use std::sync::Arc;

use chrono::{Duration, Utc};

use arrivo_core::types::{MessageStatus, MessageType};
use arrivo_engine::ConfirmationSender;
use arrivo_storage::queries::{bookings, tracking};
use arrivo_test_utils::{MockGateway, TestDb, booking, customer};

fn iso(t: chrono::DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[tokio::test]
async fn confirmation_send_creates_tracking_record() {
    let test_db = TestDb::new().await;
    let gateway = Arc::new(MockGateway::new());
    let sender = ConfirmationSender::new(test_db.db.clone(), gateway.clone());

    let c = customer("cust-1");
    let b = booking("book-1", "cust-1", &iso(Utc::now() + Duration::hours(48)));
    bookings::create_customer(&test_db.db, &c).await.unwrap();
    bookings::create_booking(&test_db.db, &b).await.unwrap();

    let message_id = sender.send_confirmation(&b, &c).await.unwrap();

    // The message went out as a business-initiated template.
    let sent = gateway.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].phone, c.phone);
    assert!(sent[0].template);
    assert!(sent[0].body.contains("consultation"));

    // The record exists exactly once, freshly sent.
    let record = tracking::get_tracking(&test_db.db, &message_id.0)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.booking_id, "book-1");
    assert_eq!(record.message_type, MessageType::Confirmation);
    assert_eq!(record.status, MessageStatus::Sent);
    assert!(record.delivered_at.is_none());
    assert!(!record.follow_up_scheduled);
}

#[tokio::test]
async fn failed_send_creates_no_record() {
    let test_db = TestDb::new().await;
    let gateway = Arc::new(MockGateway::new());
    gateway.fail_next(1).await;
    let sender = ConfirmationSender::new(test_db.db.clone(), gateway.clone());

    let c = customer("cust-1");
    let b = booking("book-1", "cust-1", &iso(Utc::now() + Duration::hours(48)));
    bookings::create_customer(&test_db.db, &c).await.unwrap();
    bookings::create_booking(&test_db.db, &b).await.unwrap();

    assert!(sender.send_confirmation(&b, &c).await.is_err());

    // Nothing to track if nothing was sent.
    let count: i64 = test_db
        .db
        .connection()
        .call(|conn| -> Result<i64, rusqlite::Error> {
            conn.query_row("SELECT COUNT(*) FROM message_tracking", [], |row| row.get(0))
        })
        .await
        .unwrap();
    assert_eq!(count, 0);
}
