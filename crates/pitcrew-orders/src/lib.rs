// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Work-order lifecycle operations for the Pitcrew tracker.
//!
//! `OrderService` is the single entry point both front-ends (Discord and
//! web) call into. Every operation loads fresh state, re-validates the
//! permission predicate, applies a conditional update, and appends a
//! best-effort audit record. Neither front-end holds any lifecycle logic
//! itself.

pub mod audit_sink;
pub mod cache;
pub mod lifecycle;
pub mod stats;

use std::sync::Arc;

use pitcrew_storage::Database;

use crate::cache::{SubsystemCache, SubsystemCacheConfig};

pub use lifecycle::CreateWorkOrder;
pub use stats::UsageStat;

/// The lifecycle service shared by both front-ends.
pub struct OrderService {
    db: Arc<Database>,
    subsystem_cache: SubsystemCache,
}

impl OrderService {
    pub fn new(db: Arc<Database>, cache_config: SubsystemCacheConfig) -> Self {
        let subsystem_cache = SubsystemCache::new(Arc::clone(&db), cache_config);
        Self {
            db,
            subsystem_cache,
        }
    }

    /// The underlying database handle, for front-end concerns that sit
    /// outside the lifecycle (user upserts, guild config, subsystem CRUD).
    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }

    /// The autocomplete-facing subsystem cache.
    pub fn subsystems(&self) -> &SubsystemCache {
        &self.subsystem_cache
    }
}
