// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed audit detail payloads.
//!
//! Each audit row carries a tagged detail record rather than a free-form
//! map, so entries are independently validatable per action kind. The
//! detail is serialized to JSON text in the `meta` column.

use serde::{Deserialize, Serialize};

use crate::types::{AuditAction, Priority, WorkOrderStatus};

/// Structured payload for one audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditDetail {
    Created {
        title: String,
        subsystem_id: String,
        priority: Priority,
    },
    Edited {
        changed_fields: Vec<String>,
    },
    Removed,
    Assigned {
        assigned_to: String,
    },
    Claimed,
    Unclaimed {
        previous_claimer: String,
    },
    StatusChanged {
        from: WorkOrderStatus,
        to: WorkOrderStatus,
    },
    Cancelled {
        from: WorkOrderStatus,
        to: WorkOrderStatus,
    },
    Cleared {
        statuses: Vec<WorkOrderStatus>,
        count: usize,
    },
    Recovered {
        count: usize,
    },
}

impl AuditDetail {
    /// The action kind this detail belongs to.
    pub fn action(&self) -> AuditAction {
        match self {
            AuditDetail::Created { .. } => AuditAction::Create,
            AuditDetail::Edited { .. } => AuditAction::Edit,
            AuditDetail::Removed => AuditAction::Remove,
            AuditDetail::Assigned { .. } => AuditAction::Assign,
            AuditDetail::Claimed => AuditAction::Claim,
            AuditDetail::Unclaimed { .. } => AuditAction::Unclaim,
            AuditDetail::StatusChanged { .. } => AuditAction::StatusChange,
            AuditDetail::Cancelled { .. } => AuditAction::Cancel,
            AuditDetail::Cleared { .. } => AuditAction::Clear,
            AuditDetail::Recovered { .. } => AuditAction::Recover,
        }
    }
}
