// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams for the external collaborators of the escalation engine.
//!
//! The engine never talks to a third-party service directly; it goes through
//! these traits so tests can substitute deterministic mocks and deployments
//! can swap implementations.

pub mod gateway;
pub mod notifier;
pub mod scheduler;

pub use gateway::MessagingGateway;
pub use notifier::ManagerNotifier;
pub use scheduler::WorkflowScheduler;
