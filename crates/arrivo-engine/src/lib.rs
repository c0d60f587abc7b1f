// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Risk scoring and escalation pipeline for the Arrivo no-show prevention
//! engine.
//!
//! Control flow: the gateway webhook feeds [`ingest::StatusIngestor`], which
//! applies compare-and-swap transitions and enqueues re-evaluation tasks.
//! [`worker::EvaluationWorker`] drains the queue through [`risk`] and arms
//! [`scheduler::EscalationScheduler`] when risk warrants. Fired checks
//! re-read state, pass the [`gate`], and act through
//! [`dispatch::ActionDispatcher`]. [`sweep::OutboxSweep`] reconciles checks
//! whose external timer never fired.

pub mod confirm;
pub mod context;
pub mod dispatch;
pub mod gate;
pub mod ingest;
pub mod risk;
pub mod scheduler;
pub mod sweep;
pub mod timer;
pub mod worker;

pub use confirm::ConfirmationSender;
pub use dispatch::{ActionDispatcher, DispatchOutcome};
pub use ingest::StatusIngestor;
pub use scheduler::{EscalationScheduler, ScheduleOutcome, SchedulerSettings};
pub use sweep::OutboxSweep;
pub use timer::TimerScheduler;
pub use worker::EvaluationWorker;
