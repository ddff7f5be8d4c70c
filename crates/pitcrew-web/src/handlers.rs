// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Work-order request handlers.
//!
//! Every handler resolves the forwarded actor identity, then delegates to
//! the shared lifecycle service; the web layer holds no lifecycle logic.

use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use pitcrew_core::types::is_admin;
use pitcrew_core::{ActorContext, PitcrewError, Priority, WorkOrder, WorkOrderStatus, WorkOrderUpdate};
use pitcrew_orders::CreateWorkOrder;
use pitcrew_storage::queries;
use serde::{Deserialize, Serialize};

use crate::auth::forwarded_identity;
use crate::{ApiError, AppState};

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// GET /health (unauthenticated, for the process supervisor).
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Resolve the forwarded identity into an actor for `guild_id`, upserting
/// the user row and deriving the admin flag from the guild config.
pub async fn resolve_actor(
    state: &AppState,
    headers: &HeaderMap,
    guild_id: &str,
) -> Result<ActorContext, PitcrewError> {
    let identity = forwarded_identity(headers)
        .ok_or_else(|| PitcrewError::PermissionDenied("missing actor identity".into()))?;

    let user = queries::users::upsert(
        state.service.db(),
        &identity.discord_user_id,
        &identity.display_name,
        None,
    )
    .await?;

    let config = queries::guild_configs::get(state.service.db(), guild_id).await?;
    let admin = config
        .as_ref()
        .is_some_and(|c| is_admin(&identity.role_ids, c));

    Ok(ActorContext::new(user.id, guild_id.to_string(), admin))
}

/// Resolve the actor for a work order addressed only by id: the row is
/// read first to learn its guild.
async fn resolve_actor_for_order(
    state: &AppState,
    headers: &HeaderMap,
    id: &str,
) -> Result<ActorContext, PitcrewError> {
    let wo = queries::work_orders::get(state.service.db(), id)
        .await?
        .ok_or_else(|| PitcrewError::work_order_not_found(id))?;
    resolve_actor(state, headers, &wo.guild_id).await
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Optional status filter (`OPEN`, `DONE`, `CANCELLED`).
    #[serde(default)]
    pub status: Option<String>,
}

fn parse_status(raw: &str) -> Result<WorkOrderStatus, PitcrewError> {
    WorkOrderStatus::from_str(raw)
        .map_err(|_| PitcrewError::Validation(format!("unknown status `{raw}`")))
}

/// GET /v1/guilds/{guild}/workorders
pub async fn list_work_orders(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<WorkOrder>>, ApiError> {
    let status = params.status.as_deref().map(parse_status).transpose()?;
    let orders = state.service.list(&guild_id, status).await?;
    Ok(Json(orders))
}

/// GET /v1/workorders/{id}
pub async fn get_work_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<WorkOrder>, ApiError> {
    let actor = resolve_actor_for_order(&state, &headers, &id).await?;
    Ok(Json(state.service.get(&actor, &id).await?))
}

/// Request body for POST /v1/guilds/{guild}/workorders.
#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub subsystem_id: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub cad_link: Option<String>,
    #[serde(default)]
    pub notify_user_ids: Vec<String>,
    #[serde(default)]
    pub notify_role_ids: Vec<String>,
}

/// POST /v1/guilds/{guild}/workorders
pub async fn create_work_order(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<CreateRequest>,
) -> Result<Json<WorkOrder>, ApiError> {
    let actor = resolve_actor(&state, &headers, &guild_id).await?;
    let priority = match body.priority.as_deref() {
        None => Priority::Medium,
        Some(raw) => Priority::from_str(raw)
            .map_err(|_| PitcrewError::Validation(format!("unknown priority `{raw}`")))?,
    };
    let wo = state
        .service
        .create(
            &actor,
            CreateWorkOrder {
                title: body.title,
                description: body.description,
                subsystem_id: body.subsystem_id,
                priority,
                cad_link: body.cad_link,
                notify_user_ids: body.notify_user_ids,
                notify_role_ids: body.notify_role_ids,
            },
        )
        .await?;
    Ok(Json(wo))
}

/// POST /v1/workorders/{id}/claim
pub async fn claim_work_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<WorkOrder>, ApiError> {
    let actor = resolve_actor_for_order(&state, &headers, &id).await?;
    Ok(Json(state.service.claim(&actor, &id).await?))
}

/// POST /v1/workorders/{id}/unclaim
pub async fn unclaim_work_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<WorkOrder>, ApiError> {
    let actor = resolve_actor_for_order(&state, &headers, &id).await?;
    Ok(Json(state.service.unclaim(&actor, &id).await?))
}

/// POST /v1/workorders/{id}/finish
pub async fn finish_work_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<WorkOrder>, ApiError> {
    let actor = resolve_actor_for_order(&state, &headers, &id).await?;
    Ok(Json(state.service.finish(&actor, &id).await?))
}

/// POST /v1/workorders/{id}/cancel
pub async fn cancel_work_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<WorkOrder>, ApiError> {
    let actor = resolve_actor_for_order(&state, &headers, &id).await?;
    Ok(Json(state.service.cancel(&actor, &id).await?))
}

/// POST /v1/workorders/{id}/remove
pub async fn remove_work_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<WorkOrder>, ApiError> {
    let actor = resolve_actor_for_order(&state, &headers, &id).await?;
    Ok(Json(state.service.remove(&actor, &id).await?))
}

/// Request body for POST /v1/workorders/{id}/assign.
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub assignee_user_id: String,
}

/// POST /v1/workorders/{id}/assign
pub async fn assign_work_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<AssignRequest>,
) -> Result<Json<WorkOrder>, ApiError> {
    let actor = resolve_actor_for_order(&state, &headers, &id).await?;
    Ok(Json(
        state.service.assign(&actor, &id, &body.assignee_user_id).await?,
    ))
}

/// PATCH /v1/workorders/{id}
pub async fn edit_work_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(update): Json<WorkOrderUpdate>,
) -> Result<Json<WorkOrder>, ApiError> {
    let actor = resolve_actor_for_order(&state, &headers, &id).await?;
    Ok(Json(state.service.edit(&actor, &id, update).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_accepts_minimal_body() {
        let body: CreateRequest = serde_json::from_str(
            r#"{"title": "Fix belt", "subsystem_id": "sub-1"}"#,
        )
        .unwrap();
        assert_eq!(body.title, "Fix belt");
        assert_eq!(body.description, "");
        assert!(body.priority.is_none());
        assert!(body.notify_user_ids.is_empty());
    }

    #[test]
    fn create_request_accepts_full_body() {
        let body: CreateRequest = serde_json::from_str(
            r#"{
                "title": "Fix belt",
                "description": "the intake belt slips",
                "subsystem_id": "sub-1",
                "priority": "HIGH",
                "cad_link": "https://cad.example/x",
                "notify_user_ids": ["1"],
                "notify_role_ids": ["2"]
            }"#,
        )
        .unwrap();
        assert_eq!(body.priority.as_deref(), Some("HIGH"));
        assert_eq!(body.notify_role_ids, vec!["2"]);
    }

    #[test]
    fn status_parse_rejects_unknown_values() {
        assert!(parse_status("OPEN").is_ok());
        assert!(parse_status("DONE").is_ok());
        assert!(matches!(
            parse_status("WONTFIX").unwrap_err(),
            PitcrewError::Validation(_)
        ));
    }

    #[test]
    fn edit_body_maps_to_work_order_update() {
        let update: WorkOrderUpdate =
            serde_json::from_str(r#"{"title": "New", "priority": "LOW"}"#).unwrap();
        assert_eq!(update.title.as_deref(), Some("New"));
        assert_eq!(update.priority, Some(Priority::Low));
        assert!(update.subsystem_id.is_none());
    }
}
