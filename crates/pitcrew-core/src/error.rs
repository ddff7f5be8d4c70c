// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Pitcrew work-order tracker.

use thiserror::Error;

/// The primary error type used across all Pitcrew crates.
///
/// Lifecycle operations return the domain variants (`NotFound`,
/// `PermissionDenied`, `InvalidState`, `Validation`) for expected
/// conditions; `Storage` wraps failures from the persistence layer and is
/// never silently swallowed for primary transitions.
#[derive(Debug, Error)]
pub enum PitcrewError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel errors from the Discord or web front-ends (connection
    /// failure, message delivery, bind failure).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A referenced entity does not exist.
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    /// The acting user is not allowed to perform this operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The work order's current status does not permit this transition.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A required field is missing or an input is malformed. Raised before
    /// any store mutation is attempted.
    #[error("validation error: {0}")]
    Validation(String),
}

impl PitcrewError {
    /// Shorthand for a `NotFound` error on a work order id.
    pub fn work_order_not_found(id: &str) -> Self {
        PitcrewError::NotFound {
            what: "work order",
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_user_readable() {
        let e = PitcrewError::work_order_not_found("wo-1");
        assert_eq!(e.to_string(), "work order not found: wo-1");

        let e = PitcrewError::PermissionDenied("admin role required".into());
        assert_eq!(e.to_string(), "permission denied: admin role required");

        let e = PitcrewError::InvalidState("work order is not open".into());
        assert_eq!(e.to_string(), "invalid state: work order is not open");
    }

    #[test]
    fn storage_error_preserves_source() {
        let e = PitcrewError::Storage {
            source: Box::new(std::io::Error::other("disk gone")),
        };
        assert!(e.to_string().contains("disk gone"));
    }
}
