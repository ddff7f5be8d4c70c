// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort audit append.
//!
//! A failed audit write is logged and swallowed; it must never block or
//! roll back the primary state transition. The primary transition's
//! success is authoritative even when the audit write fails.

use pitcrew_core::audit::AuditDetail;
use pitcrew_storage::{queries, Database};
use tracing::warn;

/// Audit rows for guild-wide operations (bulk clear/recover) that are not
/// keyed to a single work order use this marker id.
pub const GUILD_WIDE: &str = "*";

/// Append one audit record describing a transition. Infallible by design.
pub async fn record(
    db: &Database,
    guild_id: &str,
    work_order_id: &str,
    actor_user_id: &str,
    detail: &AuditDetail,
) {
    let meta = match serde_json::to_string(detail) {
        Ok(meta) => meta,
        Err(e) => {
            warn!(error = %e, action = %detail.action(), "failed to serialize audit detail");
            return;
        }
    };
    if let Err(e) = queries::audit::insert(
        db,
        guild_id,
        work_order_id,
        actor_user_id,
        detail.action(),
        &meta,
    )
    .await
    {
        warn!(
            error = %e,
            action = %detail.action(),
            work_order_id,
            "failed to append audit record"
        );
    }
}
