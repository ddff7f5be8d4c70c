// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-guild configuration rows. Role id lists are stored as JSON text.

use pitcrew_core::PitcrewError;
use rusqlite::params;

use crate::database::{map_tr_err, now_rfc3339, Database};
use crate::models::GuildConfig;

fn row_to_config(row: &rusqlite::Row<'_>) -> rusqlite::Result<GuildConfig> {
    let admin_role_ids: String = row.get(1)?;
    let member_role_ids: String = row.get(2)?;
    Ok(GuildConfig {
        guild_id: row.get(0)?,
        admin_role_ids: serde_json::from_str(&admin_role_ids).unwrap_or_default(),
        member_role_ids: serde_json::from_str(&member_role_ids).unwrap_or_default(),
        work_orders_channel_id: row.get(3)?,
        timezone: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Get the configuration for a guild.
pub async fn get(db: &Database, guild_id: &str) -> Result<Option<GuildConfig>, PitcrewError> {
    let guild_id = guild_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT guild_id, admin_role_ids, member_role_ids, work_orders_channel_id,
                        timezone, updated_at
                 FROM guild_configs WHERE guild_id = ?1",
                params![guild_id],
                row_to_config,
            );
            match result {
                Ok(config) => Ok(Some(config)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Create or replace a guild's configuration, keyed by guild_id.
pub async fn upsert(db: &Database, config: &GuildConfig) -> Result<GuildConfig, PitcrewError> {
    let config = config.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO guild_configs
                     (guild_id, admin_role_ids, member_role_ids, work_orders_channel_id,
                      timezone, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (guild_id) DO UPDATE SET
                     admin_role_ids = excluded.admin_role_ids,
                     member_role_ids = excluded.member_role_ids,
                     work_orders_channel_id = excluded.work_orders_channel_id,
                     timezone = excluded.timezone,
                     updated_at = excluded.updated_at",
                params![
                    config.guild_id,
                    serde_json::to_string(&config.admin_role_ids)
                        .unwrap_or_else(|_| "[]".into()),
                    serde_json::to_string(&config.member_role_ids)
                        .unwrap_or_else(|_| "[]".into()),
                    config.work_orders_channel_id,
                    config.timezone,
                    now_rfc3339(),
                ],
            )?;
            let saved = conn.query_row(
                "SELECT guild_id, admin_role_ids, member_role_ids, work_orders_channel_id,
                        timezone, updated_at
                 FROM guild_configs WHERE guild_id = ?1",
                params![config.guild_id],
                row_to_config,
            )?;
            Ok(saved)
        })
        .await
        .map_err(map_tr_err)
}
