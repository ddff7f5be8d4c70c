// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entity types shared across the storage layer and both front-ends.
//!
//! Timestamps are RFC 3339 strings as stored in SQLite. Rows are validated
//! into these types at the storage boundary; untyped rows never propagate
//! into lifecycle logic.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Hours after a bulk clear during which `recover` can undo it. Rows whose
/// `cleared_at` is older than this are eligible for the external hard-delete
/// sweep; the core never deletes them itself.
pub const CLEAR_RECOVERY_WINDOW_HOURS: i64 = 24;

/// Work-order priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Human label for embeds and tables.
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

/// Work-order status. `Open` is the only non-terminal status: `Done` and
/// `Cancelled` admit no further transitions except the orthogonal
/// clear/recover soft-delete path.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkOrderStatus {
    Open,
    Done,
    Cancelled,
}

impl WorkOrderStatus {
    pub fn label(&self) -> &'static str {
        match self {
            WorkOrderStatus::Open => "Open",
            WorkOrderStatus::Done => "Done",
            WorkOrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkOrderStatus::Open)
    }
}

/// Audit action kinds. One row is appended per lifecycle transition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Edit,
    Remove,
    Assign,
    Claim,
    Unclaim,
    StatusChange,
    Cancel,
    Clear,
    Recover,
}

/// The central entity: a trackable task with a status, owner, and optional
/// claimant/assignee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: String,
    pub title: String,
    pub description: String,
    pub subsystem_id: String,
    pub priority: Priority,
    pub status: WorkOrderStatus,
    pub created_by_user_id: String,
    pub assigned_to_user_id: Option<String>,
    pub claimed_by_user_id: Option<String>,
    /// Discord message/channel/thread of the posted card, if any.
    pub discord_message_id: Option<String>,
    pub discord_channel_id: Option<String>,
    pub discord_thread_id: Option<String>,
    pub guild_id: String,
    /// Hidden from listings but preserved for audit/recovery.
    pub is_deleted: bool,
    /// Non-null while inside the bulk-clear recovery window.
    pub cleared_at: Option<String>,
    pub cad_link: Option<String>,
    /// Discord user ids to mention when the card is posted.
    pub notify_user_ids: Vec<String>,
    /// Discord role ids to mention when the card is posted.
    pub notify_role_ids: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Guild-scoped work-order category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subsystem {
    pub id: String,
    pub guild_id: String,
    pub name: String,
    pub display_name: String,
    pub emoji: String,
    pub color: String,
    pub sort_order: i64,
}

/// Maps a Discord identity to an internal identity. Upserted on first
/// interaction, keyed by `discord_user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub discord_user_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub last_seen_at: String,
}

/// Per-guild settings. Read-only input to permission resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildConfig {
    pub guild_id: String,
    pub admin_role_ids: Vec<String>,
    pub member_role_ids: Vec<String>,
    pub work_orders_channel_id: Option<String>,
    pub timezone: String,
    pub updated_at: String,
}

/// Append-only audit record. Never mutated or deleted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: i64,
    pub guild_id: String,
    pub work_order_id: String,
    pub actor_user_id: String,
    pub action: AuditAction,
    /// JSON-serialized [`crate::audit::AuditDetail`].
    pub meta: String,
    pub created_at: String,
}

/// Partial update payload for `edit`. Only supplied fields are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkOrderUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub subsystem_id: Option<String>,
    pub cad_link: Option<String>,
}

impl WorkOrderUpdate {
    /// True when no field is supplied. An empty edit is a validation error
    /// and must not reach the store.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.subsystem_id.is_none()
            && self.cad_link.is_none()
    }

    /// Names of the supplied fields, for the audit record.
    pub fn changed_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title".to_string());
        }
        if self.description.is_some() {
            fields.push("description".to_string());
        }
        if self.priority.is_some() {
            fields.push("priority".to_string());
        }
        if self.subsystem_id.is_some() {
            fields.push("subsystem_id".to_string());
        }
        if self.cad_link.is_some() {
            fields.push("cad_link".to_string());
        }
        fields
    }
}

/// The acting identity threaded into every lifecycle and permission call.
///
/// `is_admin` is resolved externally (role membership against
/// `GuildConfig.admin_role_ids`) and passed in as a plain boolean so the
/// predicate layer stays pure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    /// Internal user id (not the Discord snowflake).
    pub user_id: String,
    pub guild_id: String,
    pub is_admin: bool,
}

impl ActorContext {
    pub fn new(user_id: impl Into<String>, guild_id: impl Into<String>, is_admin: bool) -> Self {
        Self {
            user_id: user_id.into(),
            guild_id: guild_id.into(),
            is_admin,
        }
    }
}

/// Resolve whether a set of role ids grants admin for a guild.
///
/// This is the only place role membership is interpreted; both front-ends
/// feed it the role list they obtained from their own identity source.
pub fn is_admin(member_role_ids: &[String], config: &GuildConfig) -> bool {
    member_role_ids
        .iter()
        .any(|r| config.admin_role_ids.contains(r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            WorkOrderStatus::Open,
            WorkOrderStatus::Done,
            WorkOrderStatus::Cancelled,
        ] {
            let s = status.to_string();
            assert_eq!(WorkOrderStatus::from_str(&s).unwrap(), status);
        }
        assert_eq!(WorkOrderStatus::Open.to_string(), "OPEN");
    }

    #[test]
    fn priority_round_trips_through_strings() {
        for p in [Priority::Low, Priority::Medium, Priority::High] {
            assert_eq!(Priority::from_str(&p.to_string()).unwrap(), p);
        }
        assert_eq!(Priority::High.to_string(), "HIGH");
    }

    #[test]
    fn audit_action_uses_screaming_snake_case() {
        assert_eq!(AuditAction::StatusChange.to_string(), "STATUS_CHANGE");
        assert_eq!(
            AuditAction::from_str("STATUS_CHANGE").unwrap(),
            AuditAction::StatusChange
        );
    }

    #[test]
    fn terminal_statuses() {
        assert!(!WorkOrderStatus::Open.is_terminal());
        assert!(WorkOrderStatus::Done.is_terminal());
        assert!(WorkOrderStatus::Cancelled.is_terminal());
    }

    fn config_with_admin_roles(roles: &[&str]) -> GuildConfig {
        GuildConfig {
            guild_id: "g1".into(),
            admin_role_ids: roles.iter().map(|r| r.to_string()).collect(),
            member_role_ids: vec![],
            work_orders_channel_id: None,
            timezone: "UTC".into(),
            updated_at: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn is_admin_matches_any_configured_role() {
        let config = config_with_admin_roles(&["111", "222"]);
        assert!(is_admin(&["333".into(), "222".into()], &config));
        assert!(!is_admin(&["333".into()], &config));
        assert!(!is_admin(&[], &config));
    }

    #[test]
    fn is_admin_with_no_configured_roles_denies_everyone() {
        let config = config_with_admin_roles(&[]);
        assert!(!is_admin(&["111".into()], &config));
    }

    #[test]
    fn empty_update_reports_no_changed_fields() {
        let update = WorkOrderUpdate::default();
        assert!(update.is_empty());
        assert!(update.changed_fields().is_empty());
    }

    #[test]
    fn update_lists_supplied_fields_only() {
        let update = WorkOrderUpdate {
            title: Some("New title".into()),
            priority: Some(Priority::High),
            ..WorkOrderUpdate::default()
        };
        assert!(!update.is_empty());
        assert_eq!(update.changed_fields(), vec!["title", "priority"]);
    }
}
