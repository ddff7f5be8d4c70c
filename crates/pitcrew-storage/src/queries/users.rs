// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User identity rows, upserted on first interaction.

use std::collections::HashMap;

use pitcrew_core::PitcrewError;
use rusqlite::params;

use crate::database::{map_tr_err, now_rfc3339, Database};
use crate::models::User;

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        discord_user_id: row.get(1)?,
        display_name: row.get(2)?,
        avatar_url: row.get(3)?,
        last_seen_at: row.get(4)?,
    })
}

/// Get or create a user from Discord info.
///
/// Upserts keyed by `discord_user_id` so concurrent commands registering
/// the same user cannot race into duplicates. Refreshes display name,
/// avatar, and `last_seen_at` on every call.
pub async fn upsert(
    db: &Database,
    discord_user_id: &str,
    display_name: &str,
    avatar_url: Option<&str>,
) -> Result<User, PitcrewError> {
    let discord_user_id = discord_user_id.to_string();
    let display_name = display_name.to_string();
    let avatar_url = avatar_url.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (id, discord_user_id, display_name, avatar_url, last_seen_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (discord_user_id) DO UPDATE SET
                     display_name = excluded.display_name,
                     avatar_url = excluded.avatar_url,
                     last_seen_at = excluded.last_seen_at",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    discord_user_id,
                    display_name,
                    avatar_url,
                    now_rfc3339(),
                ],
            )?;
            let user = conn.query_row(
                "SELECT id, discord_user_id, display_name, avatar_url, last_seen_at
                 FROM users WHERE discord_user_id = ?1",
                params![discord_user_id],
                row_to_user,
            )?;
            Ok(user)
        })
        .await
        .map_err(map_tr_err)
}

/// Get a user by internal id.
pub async fn get(db: &Database, id: &str) -> Result<Option<User>, PitcrewError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, discord_user_id, display_name, avatar_url, last_seen_at
                 FROM users WHERE id = ?1",
                params![id],
                row_to_user,
            );
            match result {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Get a user by Discord snowflake id.
pub async fn get_by_discord_id(
    db: &Database,
    discord_user_id: &str,
) -> Result<Option<User>, PitcrewError> {
    let discord_user_id = discord_user_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, discord_user_id, display_name, avatar_url, last_seen_at
                 FROM users WHERE discord_user_id = ?1",
                params![discord_user_id],
                row_to_user,
            );
            match result {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Resolve display names for a set of internal user ids. Missing ids are
/// simply absent from the map.
pub async fn display_names(
    db: &Database,
    ids: &[String],
) -> Result<HashMap<String, String>, PitcrewError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let ids = ids.to_vec();
    db.connection()
        .call(move |conn| {
            let placeholders: Vec<String> =
                (0..ids.len()).map(|i| format!("?{}", i + 1)).collect();
            let sql = format!(
                "SELECT id, display_name FROM users WHERE id IN ({})",
                placeholders.join(", ")
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                rusqlite::params_from_iter(ids.iter()),
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )?;
            let mut map = HashMap::new();
            for row in rows {
                let (id, name) = row?;
                map.insert(id, name);
            }
            Ok(map)
        })
        .await
        .map_err(map_tr_err)
}
