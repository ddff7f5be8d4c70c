// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Work-order CRUD and conditional state-transition updates.
//!
//! State-changing updates re-assert their precondition in the WHERE clause
//! and return the number of affected rows; zero means the precondition no
//! longer held at write time (a lost race) and the caller re-reads the row
//! to produce a precise error.

use std::str::FromStr;

use pitcrew_core::PitcrewError;
use rusqlite::{params, params_from_iter};

use crate::database::{map_tr_err, now_rfc3339, Database};
use crate::models::{Priority, WorkOrder, WorkOrderStatus, WorkOrderUpdate};

const COLUMNS: &str = "id, title, description, subsystem_id, priority, status, \
     created_by_user_id, assigned_to_user_id, claimed_by_user_id, \
     discord_message_id, discord_channel_id, discord_thread_id, guild_id, \
     is_deleted, cleared_at, cad_link, notify_user_ids, notify_role_ids, \
     created_at, updated_at";

fn parse_enum_col<T: FromStr>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    T::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_work_order(row: &rusqlite::Row<'_>) -> rusqlite::Result<WorkOrder> {
    let priority: String = row.get(4)?;
    let status: String = row.get(5)?;
    let notify_user_ids: String = row.get(16)?;
    let notify_role_ids: String = row.get(17)?;
    Ok(WorkOrder {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        subsystem_id: row.get(3)?,
        priority: parse_enum_col::<Priority>(4, &priority)?,
        status: parse_enum_col::<WorkOrderStatus>(5, &status)?,
        created_by_user_id: row.get(6)?,
        assigned_to_user_id: row.get(7)?,
        claimed_by_user_id: row.get(8)?,
        discord_message_id: row.get(9)?,
        discord_channel_id: row.get(10)?,
        discord_thread_id: row.get(11)?,
        guild_id: row.get(12)?,
        is_deleted: row.get(13)?,
        cleared_at: row.get(14)?,
        cad_link: row.get(15)?,
        notify_user_ids: serde_json::from_str(&notify_user_ids).unwrap_or_default(),
        notify_role_ids: serde_json::from_str(&notify_role_ids).unwrap_or_default(),
        created_at: row.get(18)?,
        updated_at: row.get(19)?,
    })
}

/// Insert a new work order row.
pub async fn insert(db: &Database, wo: &WorkOrder) -> Result<(), PitcrewError> {
    let wo = wo.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO work_orders (id, title, description, subsystem_id, priority, status,
                     created_by_user_id, assigned_to_user_id, claimed_by_user_id,
                     discord_message_id, discord_channel_id, discord_thread_id, guild_id,
                     is_deleted, cleared_at, cad_link, notify_user_ids, notify_role_ids,
                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                     ?16, ?17, ?18, ?19, ?20)",
                params![
                    wo.id,
                    wo.title,
                    wo.description,
                    wo.subsystem_id,
                    wo.priority.to_string(),
                    wo.status.to_string(),
                    wo.created_by_user_id,
                    wo.assigned_to_user_id,
                    wo.claimed_by_user_id,
                    wo.discord_message_id,
                    wo.discord_channel_id,
                    wo.discord_thread_id,
                    wo.guild_id,
                    wo.is_deleted,
                    wo.cleared_at,
                    wo.cad_link,
                    serde_json::to_string(&wo.notify_user_ids).unwrap_or_else(|_| "[]".into()),
                    serde_json::to_string(&wo.notify_role_ids).unwrap_or_else(|_| "[]".into()),
                    wo.created_at,
                    wo.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a work order by id, including soft-deleted rows.
pub async fn get(db: &Database, id: &str) -> Result<Option<WorkOrder>, PitcrewError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn
                .prepare(&format!("SELECT {COLUMNS} FROM work_orders WHERE id = ?1"))?;
            let result = stmt.query_row(params![id], row_to_work_order);
            match result {
                Ok(wo) => Ok(Some(wo)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// List non-deleted work orders for a guild, optionally filtered by status,
/// newest first.
pub async fn list(
    db: &Database,
    guild_id: &str,
    status: Option<WorkOrderStatus>,
) -> Result<Vec<WorkOrder>, PitcrewError> {
    let guild_id = guild_id.to_string();
    let status = status.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            let mut orders = Vec::new();
            match &status {
                Some(status) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {COLUMNS} FROM work_orders
                         WHERE guild_id = ?1 AND status = ?2 AND is_deleted = 0
                         ORDER BY created_at DESC, rowid DESC"
                    ))?;
                    let rows = stmt.query_map(params![guild_id, status], row_to_work_order)?;
                    for row in rows {
                        orders.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {COLUMNS} FROM work_orders
                         WHERE guild_id = ?1 AND is_deleted = 0
                         ORDER BY created_at DESC, rowid DESC"
                    ))?;
                    let rows = stmt.query_map(params![guild_id], row_to_work_order)?;
                    for row in rows {
                        orders.push(row?);
                    }
                }
            }
            Ok(orders)
        })
        .await
        .map_err(map_tr_err)
}

/// Conditionally set the claimer. Succeeds only if the row is still OPEN
/// and unclaimed at write time. Returns affected row count.
pub async fn claim(db: &Database, id: &str, user_id: &str) -> Result<usize, PitcrewError> {
    let id = id.to_string();
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "UPDATE work_orders
                 SET claimed_by_user_id = ?1, updated_at = ?2
                 WHERE id = ?3 AND status = 'OPEN' AND claimed_by_user_id IS NULL",
                params![user_id, now_rfc3339(), id],
            )?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}

/// Conditionally release a claim. Succeeds only if the row is still OPEN
/// and claimed by `expected_claimer` at write time.
pub async fn unclaim(
    db: &Database,
    id: &str,
    expected_claimer: &str,
) -> Result<usize, PitcrewError> {
    let id = id.to_string();
    let expected_claimer = expected_claimer.to_string();
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "UPDATE work_orders
                 SET claimed_by_user_id = NULL, updated_at = ?1
                 WHERE id = ?2 AND status = 'OPEN' AND claimed_by_user_id = ?3",
                params![now_rfc3339(), id, expected_claimer],
            )?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}

/// Conditionally transition status. Succeeds only if the row still has
/// status `from` at write time.
pub async fn set_status(
    db: &Database,
    id: &str,
    from: WorkOrderStatus,
    to: WorkOrderStatus,
) -> Result<usize, PitcrewError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "UPDATE work_orders SET status = ?1, updated_at = ?2
                 WHERE id = ?3 AND status = ?4",
                params![to.to_string(), now_rfc3339(), id, from.to_string()],
            )?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}

/// Set (or clear) the assignee.
pub async fn assign(
    db: &Database,
    id: &str,
    assignee: Option<&str>,
) -> Result<usize, PitcrewError> {
    let id = id.to_string();
    let assignee = assignee.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "UPDATE work_orders SET assigned_to_user_id = ?1, updated_at = ?2
                 WHERE id = ?3",
                params![assignee, now_rfc3339(), id],
            )?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}

/// Apply a partial edit, writing only the supplied fields.
pub async fn apply_update(
    db: &Database,
    id: &str,
    update: &WorkOrderUpdate,
) -> Result<usize, PitcrewError> {
    if update.is_empty() {
        return Ok(0);
    }
    let id = id.to_string();
    let update = update.clone();
    db.connection()
        .call(move |conn| {
            let mut sets: Vec<&str> = Vec::new();
            let mut values: Vec<rusqlite::types::Value> = Vec::new();
            if let Some(title) = update.title {
                sets.push("title");
                values.push(title.into());
            }
            if let Some(description) = update.description {
                sets.push("description");
                values.push(description.into());
            }
            if let Some(priority) = update.priority {
                sets.push("priority");
                values.push(priority.to_string().into());
            }
            if let Some(subsystem_id) = update.subsystem_id {
                sets.push("subsystem_id");
                values.push(subsystem_id.into());
            }
            if let Some(cad_link) = update.cad_link {
                sets.push("cad_link");
                values.push(cad_link.into());
            }

            let assignments: Vec<String> = sets
                .iter()
                .enumerate()
                .map(|(i, col)| format!("{col} = ?{}", i + 1))
                .collect();
            let sql = format!(
                "UPDATE work_orders SET {}, updated_at = ?{} WHERE id = ?{}",
                assignments.join(", "),
                values.len() + 1,
                values.len() + 2,
            );
            values.push(now_rfc3339().into());
            values.push(id.into());

            let n = conn.execute(&sql, params_from_iter(values))?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}

/// Persist the Discord card location so it can be edited later.
pub async fn set_discord_refs(
    db: &Database,
    id: &str,
    message_id: &str,
    channel_id: &str,
) -> Result<(), PitcrewError> {
    let id = id.to_string();
    let message_id = message_id.to_string();
    let channel_id = channel_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE work_orders
                 SET discord_message_id = ?1, discord_channel_id = ?2, updated_at = ?3
                 WHERE id = ?4",
                params![message_id, channel_id, now_rfc3339(), id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Soft-delete a single work order.
pub async fn soft_delete(db: &Database, id: &str) -> Result<usize, PitcrewError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "UPDATE work_orders SET is_deleted = 1, updated_at = ?1 WHERE id = ?2",
                params![now_rfc3339(), id],
            )?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}

/// Soft-delete all non-deleted rows in the guild matching the given
/// statuses, stamping them all with the same `cleared_at`. Returns the
/// number of rows cleared.
pub async fn bulk_clear(
    db: &Database,
    guild_id: &str,
    statuses: &[WorkOrderStatus],
    cleared_at: &str,
) -> Result<usize, PitcrewError> {
    let guild_id = guild_id.to_string();
    let statuses: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();
    let cleared_at = cleared_at.to_string();
    db.connection()
        .call(move |conn| {
            let placeholders: Vec<String> = (0..statuses.len())
                .map(|i| format!("?{}", i + 3))
                .collect();
            let sql = format!(
                "UPDATE work_orders SET is_deleted = 1, cleared_at = ?1, updated_at = ?1
                 WHERE guild_id = ?2 AND is_deleted = 0 AND status IN ({})",
                placeholders.join(", ")
            );
            let mut values: Vec<rusqlite::types::Value> = vec![
                cleared_at.into(),
                guild_id.into(),
            ];
            values.extend(statuses.into_iter().map(rusqlite::types::Value::from));
            let n = conn.execute(&sql, params_from_iter(values))?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}

/// Restore every row in the guild still inside the clear window (non-null
/// `cleared_at`), regardless of which clear batch set it. Returns the
/// number of rows restored.
pub async fn recover_cleared(db: &Database, guild_id: &str) -> Result<usize, PitcrewError> {
    let guild_id = guild_id.to_string();
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "UPDATE work_orders
                 SET is_deleted = 0, cleared_at = NULL, updated_at = ?1
                 WHERE guild_id = ?2 AND cleared_at IS NOT NULL",
                params![now_rfc3339(), guild_id],
            )?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{subsystems, users};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        // Referenced rows for FK constraints.
        users::upsert(&db, "discord-1", "alice", None).await.unwrap();
        users::upsert(&db, "discord-2", "bob", None).await.unwrap();
        subsystems::insert(
            &db,
            &crate::models::Subsystem {
                id: "sub-1".into(),
                guild_id: "g1".into(),
                name: "drivetrain".into(),
                display_name: "Drivetrain".into(),
                emoji: String::new(),
                color: "#999999".into(),
                sort_order: 0,
            },
        )
        .await
        .unwrap();
        (db, dir)
    }

    async fn user_id(db: &Database, discord_id: &str) -> String {
        users::get_by_discord_id(db, discord_id)
            .await
            .unwrap()
            .unwrap()
            .id
    }

    fn make_wo(id: &str, creator: &str) -> WorkOrder {
        WorkOrder {
            id: id.into(),
            title: "Fix belt tension".into(),
            description: String::new(),
            subsystem_id: "sub-1".into(),
            priority: Priority::Medium,
            status: WorkOrderStatus::Open,
            created_by_user_id: creator.into(),
            assigned_to_user_id: None,
            claimed_by_user_id: None,
            discord_message_id: None,
            discord_channel_id: None,
            discord_thread_id: None,
            guild_id: "g1".into(),
            is_deleted: false,
            cleared_at: None,
            cad_link: None,
            notify_user_ids: vec!["111".into()],
            notify_role_ids: vec![],
            created_at: "2026-01-01T00:00:00.000Z".into(),
            updated_at: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    #[tokio::test]
    async fn insert_and_get_round_trips() {
        let (db, _dir) = setup_db().await;
        let creator = user_id(&db, "discord-1").await;
        insert(&db, &make_wo("wo-1", &creator)).await.unwrap();

        let wo = get(&db, "wo-1").await.unwrap().unwrap();
        assert_eq!(wo.title, "Fix belt tension");
        assert_eq!(wo.subsystem_id, "sub-1");
        assert_eq!(wo.priority, Priority::Medium);
        assert_eq!(wo.status, WorkOrderStatus::Open);
        assert_eq!(wo.created_by_user_id, creator);
        assert_eq!(wo.claimed_by_user_id, None);
        assert_eq!(wo.notify_user_ids, vec!["111".to_string()]);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let (db, _dir) = setup_db().await;
        assert!(get(&db, "no-such-id").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_excludes_deleted_and_filters_status() {
        let (db, _dir) = setup_db().await;
        let creator = user_id(&db, "discord-1").await;

        insert(&db, &make_wo("wo-1", &creator)).await.unwrap();
        let mut done = make_wo("wo-2", &creator);
        done.status = WorkOrderStatus::Done;
        insert(&db, &done).await.unwrap();
        let mut deleted = make_wo("wo-3", &creator);
        deleted.is_deleted = true;
        insert(&db, &deleted).await.unwrap();

        let all = list(&db, "g1", None).await.unwrap();
        assert_eq!(all.len(), 2);

        let open = list(&db, "g1", Some(WorkOrderStatus::Open)).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, "wo-1");

        assert!(list(&db, "other-guild", None).await.unwrap().is_empty());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn claim_is_conditional_on_unclaimed_open_row() {
        let (db, _dir) = setup_db().await;
        let creator = user_id(&db, "discord-1").await;
        let bob = user_id(&db, "discord-2").await;
        insert(&db, &make_wo("wo-1", &creator)).await.unwrap();

        assert_eq!(claim(&db, "wo-1", &creator).await.unwrap(), 1);
        // Second claim loses the race: zero rows affected.
        assert_eq!(claim(&db, "wo-1", &bob).await.unwrap(), 0);

        let wo = get(&db, "wo-1").await.unwrap().unwrap();
        assert_eq!(wo.claimed_by_user_id, Some(creator));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn unclaim_requires_expected_claimer() {
        let (db, _dir) = setup_db().await;
        let creator = user_id(&db, "discord-1").await;
        let bob = user_id(&db, "discord-2").await;
        insert(&db, &make_wo("wo-1", &creator)).await.unwrap();
        claim(&db, "wo-1", &creator).await.unwrap();

        assert_eq!(unclaim(&db, "wo-1", &bob).await.unwrap(), 0);
        assert_eq!(unclaim(&db, "wo-1", &creator).await.unwrap(), 1);

        let wo = get(&db, "wo-1").await.unwrap().unwrap();
        assert_eq!(wo.claimed_by_user_id, None);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn set_status_is_conditional_on_from_status() {
        let (db, _dir) = setup_db().await;
        let creator = user_id(&db, "discord-1").await;
        insert(&db, &make_wo("wo-1", &creator)).await.unwrap();

        assert_eq!(
            set_status(&db, "wo-1", WorkOrderStatus::Open, WorkOrderStatus::Done)
                .await
                .unwrap(),
            1
        );
        // Already DONE: the cancel transition must not apply.
        assert_eq!(
            set_status(&db, "wo-1", WorkOrderStatus::Open, WorkOrderStatus::Cancelled)
                .await
                .unwrap(),
            0
        );

        let wo = get(&db, "wo-1").await.unwrap().unwrap();
        assert_eq!(wo.status, WorkOrderStatus::Done);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn apply_update_writes_only_supplied_fields() {
        let (db, _dir) = setup_db().await;
        let creator = user_id(&db, "discord-1").await;
        insert(&db, &make_wo("wo-1", &creator)).await.unwrap();

        let update = WorkOrderUpdate {
            title: Some("Re-tension belt".into()),
            priority: Some(Priority::High),
            ..WorkOrderUpdate::default()
        };
        assert_eq!(apply_update(&db, "wo-1", &update).await.unwrap(), 1);

        let wo = get(&db, "wo-1").await.unwrap().unwrap();
        assert_eq!(wo.title, "Re-tension belt");
        assert_eq!(wo.priority, Priority::High);
        assert_eq!(wo.description, "");
        assert_eq!(wo.subsystem_id, "sub-1");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn bulk_clear_and_recover_round_trip() {
        let (db, _dir) = setup_db().await;
        let creator = user_id(&db, "discord-1").await;

        insert(&db, &make_wo("wo-open", &creator)).await.unwrap();
        for id in ["wo-d1", "wo-d2", "wo-d3"] {
            let mut wo = make_wo(id, &creator);
            wo.status = WorkOrderStatus::Done;
            insert(&db, &wo).await.unwrap();
        }

        let ts = now_rfc3339();
        let cleared = bulk_clear(&db, "g1", &[WorkOrderStatus::Done], &ts)
            .await
            .unwrap();
        assert_eq!(cleared, 3);

        // All three share the same cleared_at; the open row is untouched.
        for id in ["wo-d1", "wo-d2", "wo-d3"] {
            let wo = get(&db, id).await.unwrap().unwrap();
            assert!(wo.is_deleted);
            assert_eq!(wo.cleared_at.as_deref(), Some(ts.as_str()));
        }
        let open = get(&db, "wo-open").await.unwrap().unwrap();
        assert!(!open.is_deleted);
        assert_eq!(open.cleared_at, None);

        let recovered = recover_cleared(&db, "g1").await.unwrap();
        assert_eq!(recovered, 3);
        for id in ["wo-d1", "wo-d2", "wo-d3"] {
            let wo = get(&db, id).await.unwrap().unwrap();
            assert!(!wo.is_deleted);
            assert_eq!(wo.cleared_at, None);
        }

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn recover_skips_individually_removed_rows() {
        let (db, _dir) = setup_db().await;
        let creator = user_id(&db, "discord-1").await;
        insert(&db, &make_wo("wo-1", &creator)).await.unwrap();

        // A single remove sets is_deleted without cleared_at, so recover
        // must leave it hidden.
        assert_eq!(soft_delete(&db, "wo-1").await.unwrap(), 1);
        assert_eq!(recover_cleared(&db, "g1").await.unwrap(), 0);

        let wo = get(&db, "wo-1").await.unwrap().unwrap();
        assert!(wo.is_deleted);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn set_discord_refs_persists_card_location() {
        let (db, _dir) = setup_db().await;
        let creator = user_id(&db, "discord-1").await;
        insert(&db, &make_wo("wo-1", &creator)).await.unwrap();

        set_discord_refs(&db, "wo-1", "msg-9", "chan-7").await.unwrap();
        let wo = get(&db, "wo-1").await.unwrap().unwrap();
        assert_eq!(wo.discord_message_id.as_deref(), Some("msg-9"));
        assert_eq!(wo.discord_channel_id.as_deref(), Some("chan-7"));

        db.close().await.unwrap();
    }
}
