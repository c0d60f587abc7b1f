// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Booking and customer CRUD operations.

use arrivo_core::ArrivoError;
use arrivo_core::types::{Booking, Customer};
use rusqlite::params;

use crate::database::{Database, map_tr_err, now_iso};

fn booking_from_row(row: &rusqlite::Row<'_>) -> Result<Booking, rusqlite::Error> {
    Ok(Booking {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        conversation_id: row.get(2)?,
        appointment_time: row.get(3)?,
        service_name: row.get(4)?,
        service_value: row.get(5)?,
        confirmation_read: row.get(6)?,
        last_inbound_at: row.get(7)?,
        created_at: row.get(8)?,
    })
}

const BOOKING_COLUMNS: &str = "id, customer_id, conversation_id, appointment_time, \
     service_name, service_value, confirmation_read, last_inbound_at, created_at";

/// Insert a new customer.
pub async fn create_customer(db: &Database, customer: &Customer) -> Result<(), ArrivoError> {
    let customer = customer.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO customers (id, phone, display_name, visit_count, no_show_count, \
                 is_vip, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    customer.id,
                    customer.phone,
                    customer.display_name,
                    customer.visit_count,
                    customer.no_show_count,
                    customer.is_vip,
                    customer.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a new booking.
pub async fn create_booking(db: &Database, booking: &Booking) -> Result<(), ArrivoError> {
    let booking = booking.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO bookings (id, customer_id, conversation_id, appointment_time, \
                 service_name, service_value, confirmation_read, last_inbound_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    booking.id,
                    booking.customer_id,
                    booking.conversation_id,
                    booking.appointment_time,
                    booking.service_name,
                    booking.service_value,
                    booking.confirmation_read,
                    booking.last_inbound_at,
                    booking.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a booking by id.
pub async fn get_booking(db: &Database, id: &str) -> Result<Option<Booking>, ArrivoError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"
            ))?;
            match stmt.query_row(params![id], booking_from_row) {
                Ok(booking) => Ok(Some(booking)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a booking together with its customer, for risk-context assembly.
pub async fn booking_with_customer(
    db: &Database,
    booking_id: &str,
) -> Result<Option<(Booking, Customer)>, ArrivoError> {
    let booking_id = booking_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT b.id, b.customer_id, b.conversation_id, b.appointment_time, \
                        b.service_name, b.service_value, b.confirmation_read, \
                        b.last_inbound_at, b.created_at, \
                        c.id, c.phone, c.display_name, c.visit_count, c.no_show_count, \
                        c.is_vip, c.created_at
                 FROM bookings b JOIN customers c ON c.id = b.customer_id
                 WHERE b.id = ?1",
            )?;
            let result = stmt.query_row(params![booking_id], |row| {
                let booking = booking_from_row(row)?;
                let customer = Customer {
                    id: row.get(9)?,
                    phone: row.get(10)?,
                    display_name: row.get(11)?,
                    visit_count: row.get(12)?,
                    no_show_count: row.get(13)?,
                    is_vip: row.get(14)?,
                    created_at: row.get(15)?,
                };
                Ok((booking, customer))
            });
            match result {
                Ok(pair) => Ok(Some(pair)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Mark the booking's confirmation as read. Idempotent.
pub async fn set_confirmation_read(db: &Database, booking_id: &str) -> Result<(), ArrivoError> {
    let booking_id = booking_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE bookings SET confirmation_read = 1 WHERE id = ?1",
                params![booking_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Refresh the session-window anchor after an inbound customer message.
pub async fn record_inbound(
    db: &Database,
    booking_id: &str,
    at: Option<&str>,
) -> Result<(), ArrivoError> {
    let booking_id = booking_id.to_string();
    let at = at.map(str::to_string).unwrap_or_else(now_iso);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE bookings SET last_inbound_at = ?2 WHERE id = ?1",
                params![booking_id, at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
