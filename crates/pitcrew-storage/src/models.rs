// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `pitcrew-core::types` for use across
//! crate boundaries. This module re-exports them for convenience within
//! the storage crate.

pub use pitcrew_core::types::{
    AuditAction, AuditLog, GuildConfig, Priority, Subsystem, User, WorkOrder, WorkOrderStatus,
    WorkOrderUpdate,
};
