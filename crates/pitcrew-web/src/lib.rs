// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Web dashboard API for the Pitcrew work-order tracker.
//!
//! An axum JSON API consumed by the dashboard UI. It is a symmetric peer
//! of the Discord front-end: the same `OrderService` lifecycle operations
//! sit behind both, plus admin-only guild configuration, subsystem CRUD,
//! bulk clear/recover, and usage statistics.

pub mod admin;
pub mod auth;
pub mod handlers;
pub mod server;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pitcrew_core::PitcrewError;
use pitcrew_orders::OrderService;
use serde::Serialize;

use crate::auth::AuthConfig;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The lifecycle service shared with the Discord front-end.
    pub service: Arc<OrderService>,
    /// Authentication configuration.
    pub auth: AuthConfig,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// Wrapper mapping domain errors onto HTTP statuses so front-ends never
/// need divergent handling paths.
pub struct ApiError(pub PitcrewError);

impl From<PitcrewError> for ApiError {
    fn from(e: PitcrewError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PitcrewError::NotFound { .. } => StatusCode::NOT_FOUND,
            PitcrewError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            PitcrewError::InvalidState(_) => StatusCode::CONFLICT,
            PitcrewError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PitcrewError::Storage { .. } | PitcrewError::Channel { .. } | PitcrewError::Config(_) => {
                tracing::error!(error = %self.0, "internal error serving API request");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = match &self.0 {
            // Do not leak internals in 500 bodies.
            PitcrewError::Storage { .. } | PitcrewError::Channel { .. } | PitcrewError::Config(_) => {
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error: body })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_for(e: PitcrewError) -> StatusCode {
        ApiError(e).into_response().status()
    }

    #[test]
    fn domain_errors_map_to_distinct_statuses() {
        assert_eq!(
            status_for(PitcrewError::work_order_not_found("x")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(PitcrewError::PermissionDenied("no".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(PitcrewError::InvalidState("done".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(PitcrewError::Validation("empty".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(PitcrewError::Storage {
                source: Box::new(std::io::Error::other("boom")),
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
