// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin request handlers: guild configuration, subsystem CRUD and
//! reordering, bulk clear/recover, and usage statistics.

use std::str::FromStr;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use pitcrew_core::{
    ActorContext, GuildConfig, PitcrewError, Subsystem, WorkOrderStatus,
    CLEAR_RECOVERY_WINDOW_HOURS,
};
use pitcrew_orders::UsageStat;
use pitcrew_storage::queries;
use serde::{Deserialize, Serialize};

use crate::handlers::resolve_actor;
use crate::{ApiError, AppState};

fn require_admin(actor: &ActorContext) -> Result<(), PitcrewError> {
    if actor.is_admin {
        Ok(())
    } else {
        Err(PitcrewError::PermissionDenied("admin role required".into()))
    }
}

/// GET /v1/guilds/{guild}/config
pub async fn get_config(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<GuildConfig>, ApiError> {
    let actor = resolve_actor(&state, &headers, &guild_id).await?;
    require_admin(&actor)?;
    let config = queries::guild_configs::get(state.service.db(), &guild_id)
        .await?
        .ok_or(PitcrewError::NotFound {
            what: "guild config",
            id: guild_id,
        })?;
    Ok(Json(config))
}

/// Request body for PUT /v1/guilds/{guild}/config.
#[derive(Debug, Deserialize)]
pub struct ConfigRequest {
    #[serde(default)]
    pub admin_role_ids: Vec<String>,
    #[serde(default)]
    pub member_role_ids: Vec<String>,
    #[serde(default)]
    pub work_orders_channel_id: Option<String>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// PUT /v1/guilds/{guild}/config
pub async fn put_config(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<ConfigRequest>,
) -> Result<Json<GuildConfig>, ApiError> {
    let actor = resolve_actor(&state, &headers, &guild_id).await?;
    require_admin(&actor)?;

    let saved = queries::guild_configs::upsert(
        state.service.db(),
        &GuildConfig {
            guild_id,
            admin_role_ids: body.admin_role_ids,
            member_role_ids: body.member_role_ids,
            work_orders_channel_id: body
                .work_orders_channel_id
                .filter(|id| !id.trim().is_empty()),
            timezone: body.timezone,
            updated_at: String::new(),
        },
    )
    .await?;
    Ok(Json(saved))
}

/// GET /v1/guilds/{guild}/subsystems
pub async fn list_subsystems(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
) -> Result<Json<Vec<Subsystem>>, ApiError> {
    let subsystems = queries::subsystems::list_for_guild(state.service.db(), &guild_id).await?;
    Ok(Json(subsystems))
}

/// Request body for POST /v1/guilds/{guild}/subsystems.
#[derive(Debug, Deserialize)]
pub struct SubsystemRequest {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "#999999".to_string()
}

/// POST /v1/guilds/{guild}/subsystems
pub async fn create_subsystem(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<SubsystemRequest>,
) -> Result<Json<Subsystem>, ApiError> {
    let actor = resolve_actor(&state, &headers, &guild_id).await?;
    require_admin(&actor)?;
    if body.name.trim().is_empty() || body.display_name.trim().is_empty() {
        return Err(PitcrewError::Validation("name and display_name are required".into()).into());
    }

    // New subsystems sort after the existing ones.
    let existing = queries::subsystems::list_for_guild(state.service.db(), &guild_id).await?;
    let sort_order = existing.iter().map(|s| s.sort_order + 1).max().unwrap_or(0);

    let subsystem = Subsystem {
        id: uuid::Uuid::new_v4().to_string(),
        guild_id: guild_id.clone(),
        name: body.name.trim().to_string(),
        display_name: body.display_name.trim().to_string(),
        emoji: body.emoji,
        color: body.color,
        sort_order,
    };
    queries::subsystems::insert(state.service.db(), &subsystem).await?;
    state.service.subsystems().invalidate(&guild_id);
    Ok(Json(subsystem))
}

/// Request body for PATCH /v1/subsystems/{id}.
#[derive(Debug, Deserialize)]
pub struct SubsystemUpdateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// PATCH /v1/subsystems/{id}
pub async fn update_subsystem(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<SubsystemUpdateRequest>,
) -> Result<Json<Subsystem>, ApiError> {
    let mut subsystem = queries::subsystems::get(state.service.db(), &id)
        .await?
        .ok_or(PitcrewError::NotFound {
            what: "subsystem",
            id: id.clone(),
        })?;
    let actor = resolve_actor(&state, &headers, &subsystem.guild_id).await?;
    require_admin(&actor)?;

    if let Some(name) = body.name {
        subsystem.name = name;
    }
    if let Some(display_name) = body.display_name {
        subsystem.display_name = display_name;
    }
    if let Some(emoji) = body.emoji {
        subsystem.emoji = emoji;
    }
    if let Some(color) = body.color {
        subsystem.color = color;
    }
    queries::subsystems::update(state.service.db(), &subsystem).await?;
    state.service.subsystems().invalidate(&subsystem.guild_id);
    Ok(Json(subsystem))
}

/// DELETE /v1/subsystems/{id}
///
/// Rejected with 422 while any work order still references the subsystem.
pub async fn delete_subsystem(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let subsystem = queries::subsystems::get(state.service.db(), &id)
        .await?
        .ok_or(PitcrewError::NotFound {
            what: "subsystem",
            id: id.clone(),
        })?;
    let actor = resolve_actor(&state, &headers, &subsystem.guild_id).await?;
    require_admin(&actor)?;

    queries::subsystems::delete(state.service.db(), &id).await?;
    state.service.subsystems().invalidate(&subsystem.guild_id);
    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// Request body for PUT /v1/guilds/{guild}/subsystems/order.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ordered_ids: Vec<String>,
}

/// PUT /v1/guilds/{guild}/subsystems/order
pub async fn reorder_subsystems(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<ReorderRequest>,
) -> Result<Json<Vec<Subsystem>>, ApiError> {
    let actor = resolve_actor(&state, &headers, &guild_id).await?;
    require_admin(&actor)?;
    if body.ordered_ids.is_empty() {
        return Err(PitcrewError::Validation("ordered_ids must not be empty".into()).into());
    }

    queries::subsystems::reorder(state.service.db(), &guild_id, &body.ordered_ids).await?;
    state.service.subsystems().invalidate(&guild_id);
    let subsystems = queries::subsystems::list_for_guild(state.service.db(), &guild_id).await?;
    Ok(Json(subsystems))
}

/// Request body for POST /v1/guilds/{guild}/clear.
#[derive(Debug, Deserialize)]
pub struct ClearRequest {
    pub statuses: Vec<String>,
}

/// Response body for clear/recover.
#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub affected: usize,
    /// For clears: how long the batch stays recoverable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_window_hours: Option<i64>,
}

/// POST /v1/guilds/{guild}/clear -- bulk soft-delete by status.
pub async fn bulk_clear(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<ClearRequest>,
) -> Result<Json<SweepResponse>, ApiError> {
    let actor = resolve_actor(&state, &headers, &guild_id).await?;
    let statuses = body
        .statuses
        .iter()
        .map(|raw| {
            WorkOrderStatus::from_str(raw)
                .map_err(|_| PitcrewError::Validation(format!("unknown status `{raw}`")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let affected = state.service.bulk_clear(&actor, &statuses).await?;
    Ok(Json(SweepResponse {
        affected,
        recovery_window_hours: Some(CLEAR_RECOVERY_WINDOW_HOURS),
    }))
}

/// POST /v1/guilds/{guild}/recover -- restore everything still inside the
/// clear window.
pub async fn recover(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SweepResponse>, ApiError> {
    let actor = resolve_actor(&state, &headers, &guild_id).await?;
    let affected = state.service.recover(&actor).await?;
    Ok(Json(SweepResponse {
        affected,
        recovery_window_hours: None,
    }))
}

/// GET /v1/guilds/{guild}/stats/usage
pub async fn usage_stats(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
) -> Result<Json<Vec<UsageStat>>, ApiError> {
    Ok(Json(state.service.usage_stats(&guild_id).await?))
}
