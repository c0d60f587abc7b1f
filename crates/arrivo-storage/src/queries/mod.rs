// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. All writes go through the single background thread.

pub mod actions;
pub mod bookings;
pub mod outbox;
pub mod queue;
pub mod tracking;

use std::str::FromStr;

/// Parse a TEXT column into a strum-backed enum, mapping parse failures to
/// a rusqlite conversion error carrying the column index.
pub(crate) fn text_enum<T>(idx: usize, s: &str) -> Result<T, rusqlite::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    s.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
