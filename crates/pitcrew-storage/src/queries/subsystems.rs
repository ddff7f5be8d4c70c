// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subsystem category rows, managed by admins via the web dashboard.
//!
//! Deletion relies on the foreign key from `work_orders.subsystem_id`: a
//! subsystem still referenced by any work order cannot be deleted, so the
//! domain layer never cascades or nulls out references itself.

use pitcrew_core::PitcrewError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::Subsystem;

const COLUMNS: &str = "id, guild_id, name, display_name, emoji, color, sort_order";

fn row_to_subsystem(row: &rusqlite::Row<'_>) -> rusqlite::Result<Subsystem> {
    Ok(Subsystem {
        id: row.get(0)?,
        guild_id: row.get(1)?,
        name: row.get(2)?,
        display_name: row.get(3)?,
        emoji: row.get(4)?,
        color: row.get(5)?,
        sort_order: row.get(6)?,
    })
}

/// All subsystems for a guild, ordered by sort_order. This feeds the
/// autocomplete cache and the dashboard.
pub async fn list_for_guild(db: &Database, guild_id: &str) -> Result<Vec<Subsystem>, PitcrewError> {
    let guild_id = guild_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM subsystems
                 WHERE guild_id = ?1 ORDER BY sort_order ASC, name ASC"
            ))?;
            let rows = stmt.query_map(params![guild_id], row_to_subsystem)?;
            let mut subsystems = Vec::new();
            for row in rows {
                subsystems.push(row?);
            }
            Ok(subsystems)
        })
        .await
        .map_err(map_tr_err)
}

/// Find a single subsystem by its primary key.
pub async fn get(db: &Database, id: &str) -> Result<Option<Subsystem>, PitcrewError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!("SELECT {COLUMNS} FROM subsystems WHERE id = ?1"),
                params![id],
                row_to_subsystem,
            );
            match result {
                Ok(sub) => Ok(Some(sub)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a new subsystem.
pub async fn insert(db: &Database, subsystem: &Subsystem) -> Result<(), PitcrewError> {
    let subsystem = subsystem.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO subsystems (id, guild_id, name, display_name, emoji, color, sort_order)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    subsystem.id,
                    subsystem.guild_id,
                    subsystem.name,
                    subsystem.display_name,
                    subsystem.emoji,
                    subsystem.color,
                    subsystem.sort_order,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Update a subsystem's editable fields.
pub async fn update(db: &Database, subsystem: &Subsystem) -> Result<usize, PitcrewError> {
    let subsystem = subsystem.clone();
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "UPDATE subsystems
                 SET name = ?1, display_name = ?2, emoji = ?3, color = ?4, sort_order = ?5
                 WHERE id = ?6",
                params![
                    subsystem.name,
                    subsystem.display_name,
                    subsystem.emoji,
                    subsystem.color,
                    subsystem.sort_order,
                    subsystem.id,
                ],
            )?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a subsystem. Rejected with a validation error while any work
/// order still references it (foreign-key protection).
pub async fn delete(db: &Database, id: &str) -> Result<usize, PitcrewError> {
    let id = id.to_string();
    let result = db
        .connection()
        .call(move |conn| {
            let n = conn.execute("DELETE FROM subsystems WHERE id = ?1", params![id])?;
            Ok(n)
        })
        .await;
    match result {
        Ok(n) => Ok(n),
        Err(tokio_rusqlite::Error::Error(rusqlite::Error::SqliteFailure(e, msg)))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            tracing::debug!(?msg, "subsystem delete blocked by foreign key");
            Err(PitcrewError::Validation(
                "subsystem is still referenced by work orders".into(),
            ))
        }
        Err(e) => Err(map_tr_err(e)),
    }
}

/// Reassign sort_order by position in `ordered_ids`, atomically.
pub async fn reorder(
    db: &Database,
    guild_id: &str,
    ordered_ids: &[String],
) -> Result<(), PitcrewError> {
    let guild_id = guild_id.to_string();
    let ordered_ids = ordered_ids.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            for (position, id) in ordered_ids.iter().enumerate() {
                tx.execute(
                    "UPDATE subsystems SET sort_order = ?1 WHERE id = ?2 AND guild_id = ?3",
                    params![position as i64, id, guild_id],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{users, work_orders};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn make_subsystem(id: &str, name: &str, sort_order: i64) -> Subsystem {
        Subsystem {
            id: id.into(),
            guild_id: "g1".into(),
            name: name.into(),
            display_name: name.to_uppercase(),
            emoji: String::new(),
            color: "#999999".into(),
            sort_order,
        }
    }

    #[tokio::test]
    async fn list_orders_by_sort_order() {
        let (db, _dir) = setup_db().await;
        insert(&db, &make_subsystem("s-b", "bumpers", 2)).await.unwrap();
        insert(&db, &make_subsystem("s-a", "arm", 1)).await.unwrap();
        insert(&db, &make_subsystem("s-d", "drivetrain", 0)).await.unwrap();

        let subs = list_for_guild(&db, "g1").await.unwrap();
        let ids: Vec<&str> = subs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s-d", "s-a", "s-b"]);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn update_rewrites_fields() {
        let (db, _dir) = setup_db().await;
        insert(&db, &make_subsystem("s-1", "arm", 0)).await.unwrap();

        let mut sub = get(&db, "s-1").await.unwrap().unwrap();
        sub.display_name = "Arm & Wrist".into();
        sub.emoji = "🦾".into();
        assert_eq!(update(&db, &sub).await.unwrap(), 1);

        let reloaded = get(&db, "s-1").await.unwrap().unwrap();
        assert_eq!(reloaded.display_name, "Arm & Wrist");
        assert_eq!(reloaded.emoji, "🦾");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn reorder_assigns_positions() {
        let (db, _dir) = setup_db().await;
        insert(&db, &make_subsystem("s-a", "arm", 0)).await.unwrap();
        insert(&db, &make_subsystem("s-b", "bumpers", 1)).await.unwrap();
        insert(&db, &make_subsystem("s-c", "climber", 2)).await.unwrap();

        reorder(&db, "g1", &["s-c".into(), "s-a".into(), "s-b".into()])
            .await
            .unwrap();

        let subs = list_for_guild(&db, "g1").await.unwrap();
        let ids: Vec<&str> = subs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s-c", "s-a", "s-b"]);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_rejected_while_referenced() {
        let (db, _dir) = setup_db().await;
        insert(&db, &make_subsystem("s-1", "arm", 0)).await.unwrap();
        let user = users::upsert(&db, "discord-1", "alice", None).await.unwrap();

        let wo = pitcrew_core::WorkOrder {
            id: "wo-1".into(),
            title: "t".into(),
            description: String::new(),
            subsystem_id: "s-1".into(),
            priority: crate::models::Priority::Low,
            status: crate::models::WorkOrderStatus::Open,
            created_by_user_id: user.id,
            assigned_to_user_id: None,
            claimed_by_user_id: None,
            discord_message_id: None,
            discord_channel_id: None,
            discord_thread_id: None,
            guild_id: "g1".into(),
            is_deleted: false,
            cleared_at: None,
            cad_link: None,
            notify_user_ids: vec![],
            notify_role_ids: vec![],
            created_at: "2026-01-01T00:00:00.000Z".into(),
            updated_at: "2026-01-01T00:00:00.000Z".into(),
        };
        work_orders::insert(&db, &wo).await.unwrap();

        let err = delete(&db, "s-1").await.unwrap_err();
        assert!(matches!(err, PitcrewError::Validation(_)));

        // Still present.
        assert!(get(&db, "s-1").await.unwrap().is_some());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_unreferenced_succeeds() {
        let (db, _dir) = setup_db().await;
        insert(&db, &make_subsystem("s-1", "arm", 0)).await.unwrap();
        assert_eq!(delete(&db, "s-1").await.unwrap(), 1);
        assert!(get(&db, "s-1").await.unwrap().is_none());
        db.close().await.unwrap();
    }
}
