// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Web API server built on axum.
//!
//! Sets up routes, auth middleware, and shared state.

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use pitcrew_core::PitcrewError;
use tower_http::cors::CorsLayer;

use crate::auth::auth_middleware;
use crate::{admin, handlers, AppState};

/// Web server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Build the full router: a public health route plus the authenticated
/// `/v1` API.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(handlers::get_health));

    let api_routes = Router::new()
        .route(
            "/v1/guilds/{guild}/workorders",
            get(handlers::list_work_orders).post(handlers::create_work_order),
        )
        .route(
            "/v1/workorders/{id}",
            get(handlers::get_work_order).patch(handlers::edit_work_order),
        )
        .route("/v1/workorders/{id}/claim", post(handlers::claim_work_order))
        .route("/v1/workorders/{id}/unclaim", post(handlers::unclaim_work_order))
        .route("/v1/workorders/{id}/finish", post(handlers::finish_work_order))
        .route("/v1/workorders/{id}/cancel", post(handlers::cancel_work_order))
        .route("/v1/workorders/{id}/assign", post(handlers::assign_work_order))
        .route("/v1/workorders/{id}/remove", post(handlers::remove_work_order))
        .route(
            "/v1/guilds/{guild}/config",
            get(admin::get_config).put(admin::put_config),
        )
        .route(
            "/v1/guilds/{guild}/subsystems",
            get(admin::list_subsystems).post(admin::create_subsystem),
        )
        .route(
            "/v1/subsystems/{id}",
            patch(admin::update_subsystem).delete(admin::delete_subsystem),
        )
        .route(
            "/v1/guilds/{guild}/subsystems/order",
            put(admin::reorder_subsystems),
        )
        .route("/v1/guilds/{guild}/clear", post(admin::bulk_clear))
        .route("/v1/guilds/{guild}/recover", post(admin::recover))
        .route("/v1/guilds/{guild}/stats/usage", get(admin::usage_stats))
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the web API server.
pub async fn start_server(config: &ServerConfig, state: AppState) -> Result<(), PitcrewError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PitcrewError::Channel {
            message: format!("failed to bind web API to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("web API listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| PitcrewError::Channel {
            message: format!("web API server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}
