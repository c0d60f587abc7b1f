// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `arrivo-core::types` for use across
//! crate boundaries. This module re-exports them for convenience within
//! the storage crate.

pub use arrivo_core::types::{
    Booking, Customer, EvaluationTask, MessageTrackingRecord, PreventionActionLogEntry,
    ScheduledCheck,
};
