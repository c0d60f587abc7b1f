// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Arrivo integration tests.
//!
//! Deterministic mocks for the three external collaborators plus a seeded
//! tempfile database harness.

pub mod harness;
pub mod mock_gateway;
pub mod mock_notifier;
pub mod mock_scheduler;

pub use harness::{TestDb, booking, confirmation, customer, seed_booking_with_confirmation};
pub use mock_gateway::MockGateway;
pub use mock_notifier::{MockNotifier, RecordedNotification};
pub use mock_scheduler::{MockScheduler, RecordedSchedule};
