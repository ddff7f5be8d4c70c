// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time-boxed subsystem cache for autocomplete.
//!
//! Autocomplete fires on every keystroke, so subsystem lists are served
//! from a per-guild TTL cache. A stale entry triggers a refresh that races
//! a timeout; on timeout or store failure the last cached value is
//! returned instead of an error. The cache is an explicit, injectable
//! component rather than module-level state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use pitcrew_core::Subsystem;
use pitcrew_storage::{queries, Database};
use tracing::{debug, warn};

/// Tuning for [`SubsystemCache`].
#[derive(Debug, Clone)]
pub struct SubsystemCacheConfig {
    /// How long a cached list stays fresh.
    pub ttl: Duration,
    /// Upper bound on a refresh fetch before falling back to stale data.
    pub refresh_timeout: Duration,
}

impl Default for SubsystemCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            refresh_timeout: Duration::from_millis(1500),
        }
    }
}

struct CacheEntry {
    fetched_at: Instant,
    subsystems: Arc<Vec<Subsystem>>,
}

/// Per-guild TTL cache over `subsystems::list_for_guild`.
pub struct SubsystemCache {
    db: Arc<Database>,
    config: SubsystemCacheConfig,
    entries: DashMap<String, CacheEntry>,
}

impl SubsystemCache {
    pub fn new(db: Arc<Database>, config: SubsystemCacheConfig) -> Self {
        Self {
            db,
            config,
            entries: DashMap::new(),
        }
    }

    /// The subsystem list for a guild: cached if fresh, refreshed with a
    /// bounded fetch otherwise, stale on refresh failure, empty only when
    /// nothing was ever cached.
    pub async fn get(&self, guild_id: &str) -> Arc<Vec<Subsystem>> {
        if let Some(entry) = self.entries.get(guild_id) {
            if entry.fetched_at.elapsed() < self.config.ttl {
                return Arc::clone(&entry.subsystems);
            }
        }

        let fetch = queries::subsystems::list_for_guild(&self.db, guild_id);
        match tokio::time::timeout(self.config.refresh_timeout, fetch).await {
            Ok(Ok(subsystems)) => {
                let subsystems = Arc::new(subsystems);
                self.entries.insert(
                    guild_id.to_string(),
                    CacheEntry {
                        fetched_at: Instant::now(),
                        subsystems: Arc::clone(&subsystems),
                    },
                );
                subsystems
            }
            Ok(Err(e)) => {
                warn!(error = %e, guild_id, "subsystem refresh failed, serving stale data");
                self.stale(guild_id)
            }
            Err(_) => {
                debug!(guild_id, "subsystem refresh timed out, serving stale data");
                self.stale(guild_id)
            }
        }
    }

    /// Drop the cached entry so the next `get` fetches fresh data. Called
    /// after subsystem CRUD from the dashboard.
    pub fn invalidate(&self, guild_id: &str) {
        self.entries.remove(guild_id);
    }

    fn stale(&self, guild_id: &str) -> Arc<Vec<Subsystem>> {
        self.entries
            .get(guild_id)
            .map(|e| Arc::clone(&e.subsystems))
            .unwrap_or_else(|| Arc::new(Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Arc<Database>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (Arc::new(db), dir)
    }

    fn make_subsystem(id: &str, sort_order: i64) -> Subsystem {
        Subsystem {
            id: id.into(),
            guild_id: "g1".into(),
            name: id.into(),
            display_name: id.to_uppercase(),
            emoji: String::new(),
            color: "#999999".into(),
            sort_order,
        }
    }

    #[tokio::test]
    async fn serves_cached_value_within_ttl() {
        let (db, _dir) = setup_db().await;
        queries::subsystems::insert(&db, &make_subsystem("arm", 0))
            .await
            .unwrap();

        let cache = SubsystemCache::new(
            Arc::clone(&db),
            SubsystemCacheConfig {
                ttl: Duration::from_secs(3600),
                refresh_timeout: Duration::from_secs(5),
            },
        );

        assert_eq!(cache.get("g1").await.len(), 1);

        // A new row is invisible until the entry expires or is invalidated.
        queries::subsystems::insert(&db, &make_subsystem("climber", 1))
            .await
            .unwrap();
        assert_eq!(cache.get("g1").await.len(), 1);

        cache.invalidate("g1");
        assert_eq!(cache.get("g1").await.len(), 2);
    }

    #[tokio::test]
    async fn zero_ttl_always_refreshes() {
        let (db, _dir) = setup_db().await;
        let cache = SubsystemCache::new(
            Arc::clone(&db),
            SubsystemCacheConfig {
                ttl: Duration::ZERO,
                refresh_timeout: Duration::from_secs(5),
            },
        );

        assert!(cache.get("g1").await.is_empty());

        queries::subsystems::insert(&db, &make_subsystem("arm", 0))
            .await
            .unwrap();
        assert_eq!(cache.get("g1").await.len(), 1);
    }

    #[tokio::test]
    async fn refresh_timeout_falls_back_to_stale_value() {
        let (db, _dir) = setup_db().await;
        queries::subsystems::insert(&db, &make_subsystem("arm", 0))
            .await
            .unwrap();

        // Prime the cache with a generous timeout.
        let cache = SubsystemCache::new(
            Arc::clone(&db),
            SubsystemCacheConfig {
                ttl: Duration::ZERO,
                refresh_timeout: Duration::from_secs(5),
            },
        );
        assert_eq!(cache.get("g1").await.len(), 1);

        // With a zero timeout every refresh loses the race; the stale
        // entry keeps being served even after the table changes.
        let starved = SubsystemCache {
            db: Arc::clone(&db),
            config: SubsystemCacheConfig {
                ttl: Duration::ZERO,
                refresh_timeout: Duration::ZERO,
            },
            entries: DashMap::new(),
        };
        // ttl is zero, so this entry is already stale.
        starved.entries.insert(
            "g1".to_string(),
            CacheEntry {
                fetched_at: Instant::now(),
                subsystems: Arc::new(vec![make_subsystem("arm", 0)]),
            },
        );
        queries::subsystems::insert(&db, &make_subsystem("climber", 1))
            .await
            .unwrap();

        let served = starved.get("g1").await;
        assert_eq!(served.len(), 1);
        assert_eq!(served[0].id, "arm");
    }

    #[tokio::test]
    async fn timeout_with_empty_cache_returns_empty_list() {
        let (db, _dir) = setup_db().await;
        let cache = SubsystemCache::new(
            Arc::clone(&db),
            SubsystemCacheConfig {
                ttl: Duration::ZERO,
                refresh_timeout: Duration::ZERO,
            },
        );
        assert!(cache.get("g1").await.is_empty());
    }
}
