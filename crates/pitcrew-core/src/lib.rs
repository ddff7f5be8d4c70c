// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Pitcrew work-order tracker.
//!
//! This crate provides the entity types, the error taxonomy, the actor
//! context, and the pure permission predicates shared by the Discord and
//! web front-ends. Nothing in here performs IO: every decision is a
//! function over values loaded by the caller.

pub mod audit;
pub mod error;
pub mod permissions;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PitcrewError;
pub use types::{
    ActorContext, AuditAction, AuditLog, GuildConfig, Priority, Subsystem, User, WorkOrder,
    WorkOrderStatus, WorkOrderUpdate, CLEAR_RECOVERY_WINDOW_HOURS,
};
