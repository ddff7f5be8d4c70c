// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication middleware for the web API.
//!
//! The API sits behind the dashboard's OAuth layer, which terminates the
//! user session and forwards requests with a service bearer token plus
//! actor identity headers (`x-actor-id`, `x-actor-name`,
//! `x-actor-roles`). This middleware validates the bearer token; actor
//! resolution happens per-handler. When no token is configured, all
//! requests are rejected (fail-closed).

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

/// Authentication configuration for the web API.
#[derive(Clone)]
pub struct AuthConfig {
    /// Expected bearer token. `None` rejects every request.
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Middleware that validates the `Authorization: Bearer <token>` header.
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected_token) = auth.bearer_token.as_ref() else {
        tracing::error!("web API has no auth configured -- rejecting request");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let provided = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        Some(token) if token == expected_token => Ok(next.run(request).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

/// The forwarded actor identity: Discord user id, display name, and the
/// member's role ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedIdentity {
    pub discord_user_id: String,
    pub display_name: String,
    pub role_ids: Vec<String>,
}

/// Extract the forwarded identity headers set by the OAuth layer.
pub fn forwarded_identity(headers: &HeaderMap) -> Option<ForwardedIdentity> {
    let discord_user_id = headers
        .get("x-actor-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())?
        .to_string();
    let display_name = headers
        .get("x-actor-name")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string();
    let role_ids = headers
        .get("x-actor-roles")
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Some(ForwardedIdentity {
        discord_user_id,
        display_name,
        role_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn auth_config_debug_redacts_token() {
        let config = AuthConfig {
            bearer_token: Some("secret-token".to_string()),
        };
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("secret-token"));
        assert!(debug_output.contains("[redacted]"));
    }

    #[test]
    fn forwarded_identity_parses_all_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-actor-id", HeaderValue::from_static("1234"));
        headers.insert("x-actor-name", HeaderValue::from_static("alice"));
        headers.insert("x-actor-roles", HeaderValue::from_static("11, 22 ,33"));

        let identity = forwarded_identity(&headers).unwrap();
        assert_eq!(identity.discord_user_id, "1234");
        assert_eq!(identity.display_name, "alice");
        assert_eq!(identity.role_ids, vec!["11", "22", "33"]);
    }

    #[test]
    fn forwarded_identity_requires_actor_id() {
        let headers = HeaderMap::new();
        assert!(forwarded_identity(&headers).is_none());

        let mut blank = HeaderMap::new();
        blank.insert("x-actor-id", HeaderValue::from_static("  "));
        assert!(forwarded_identity(&blank).is_none());
    }

    #[test]
    fn missing_optional_headers_use_defaults() {
        let mut headers = HeaderMap::new();
        headers.insert("x-actor-id", HeaderValue::from_static("1234"));
        let identity = forwarded_identity(&headers).unwrap();
        assert_eq!(identity.display_name, "unknown");
        assert!(identity.role_ids.is_empty());
    }
}
