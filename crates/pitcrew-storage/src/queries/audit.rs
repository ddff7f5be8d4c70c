// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only audit log. Rows are never updated or deleted by the core.

use std::str::FromStr;

use pitcrew_core::PitcrewError;
use rusqlite::params;

use crate::database::{map_tr_err, now_rfc3339, Database};
use crate::models::{AuditAction, AuditLog};

fn row_to_audit(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditLog> {
    let action: String = row.get(4)?;
    Ok(AuditLog {
        id: row.get(0)?,
        guild_id: row.get(1)?,
        work_order_id: row.get(2)?,
        actor_user_id: row.get(3)?,
        action: AuditAction::from_str(&action).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?,
        meta: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Append one audit record. Returns the new row id.
pub async fn insert(
    db: &Database,
    guild_id: &str,
    work_order_id: &str,
    actor_user_id: &str,
    action: AuditAction,
    meta_json: &str,
) -> Result<i64, PitcrewError> {
    let guild_id = guild_id.to_string();
    let work_order_id = work_order_id.to_string();
    let actor_user_id = actor_user_id.to_string();
    let meta_json = meta_json.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO audit_logs (guild_id, work_order_id, actor_user_id, action,
                     meta, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    guild_id,
                    work_order_id,
                    actor_user_id,
                    action.to_string(),
                    meta_json,
                    now_rfc3339(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// All audit records for a work order, oldest first.
pub async fn list_for_work_order(
    db: &Database,
    work_order_id: &str,
) -> Result<Vec<AuditLog>, PitcrewError> {
    let work_order_id = work_order_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, guild_id, work_order_id, actor_user_id, action, meta, created_at
                 FROM audit_logs WHERE work_order_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![work_order_id], row_to_audit)?;
            let mut logs = Vec::new();
            for row in rows {
                logs.push(row?);
            }
            Ok(logs)
        })
        .await
        .map_err(map_tr_err)
}

/// Per-actor counts of the given actions within a guild, for the usage
/// statistics view. Returns `(actor_user_id, action, count)` tuples.
pub async fn action_counts(
    db: &Database,
    guild_id: &str,
    actions: &[AuditAction],
) -> Result<Vec<(String, AuditAction, i64)>, PitcrewError> {
    let guild_id = guild_id.to_string();
    let actions: Vec<String> = actions.iter().map(|a| a.to_string()).collect();
    db.connection()
        .call(move |conn| {
            let placeholders: Vec<String> =
                (0..actions.len()).map(|i| format!("?{}", i + 2)).collect();
            let sql = format!(
                "SELECT actor_user_id, action, COUNT(*)
                 FROM audit_logs
                 WHERE guild_id = ?1 AND action IN ({})
                 GROUP BY actor_user_id, action",
                placeholders.join(", ")
            );
            let mut values: Vec<rusqlite::types::Value> = vec![guild_id.into()];
            values.extend(actions.into_iter().map(rusqlite::types::Value::from));

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(rusqlite::params_from_iter(values), |row| {
                let action: String = row.get(1)?;
                Ok((
                    row.get::<_, String>(0)?,
                    AuditAction::from_str(&action).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            1,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?,
                    row.get::<_, i64>(2)?,
                ))
            })?;
            let mut counts = Vec::new();
            for row in rows {
                counts.push(row?);
            }
            Ok(counts)
        })
        .await
        .map_err(map_tr_err)
}
