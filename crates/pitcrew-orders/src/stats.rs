// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage statistics aggregated from the audit log.
//!
//! Counts CLAIM and STATUS_CHANGE actions per actor for a guild, resolving
//! display names from the users table. This backs the dashboard's usage
//! leaderboard.

use std::collections::HashMap;

use pitcrew_core::{AuditAction, PitcrewError};
use pitcrew_storage::queries;
use serde::Serialize;

use crate::OrderService;

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageStat {
    pub user_id: String,
    pub display_name: String,
    pub claimed_count: i64,
    pub completed_count: i64,
}

impl OrderService {
    /// Per-member claim/completion counts for a guild, sorted by completed
    /// descending, then claimed descending.
    pub async fn usage_stats(&self, guild_id: &str) -> Result<Vec<UsageStat>, PitcrewError> {
        let counts = queries::audit::action_counts(
            self.db(),
            guild_id,
            &[AuditAction::Claim, AuditAction::StatusChange],
        )
        .await?;

        let mut by_user: HashMap<String, (i64, i64)> = HashMap::new();
        for (actor, action, count) in counts {
            let entry = by_user.entry(actor).or_insert((0, 0));
            match action {
                AuditAction::Claim => entry.0 += count,
                AuditAction::StatusChange => entry.1 += count,
                _ => {}
            }
        }

        let user_ids: Vec<String> = by_user.keys().cloned().collect();
        let names = queries::users::display_names(self.db(), &user_ids).await?;

        let mut stats: Vec<UsageStat> = by_user
            .into_iter()
            .map(|(user_id, (claimed, completed))| {
                let display_name = names
                    .get(&user_id)
                    .cloned()
                    .unwrap_or_else(|| truncated_id(&user_id));
                UsageStat {
                    user_id,
                    display_name,
                    claimed_count: claimed,
                    completed_count: completed,
                }
            })
            .collect();
        stats.sort_by(|a, b| {
            b.completed_count
                .cmp(&a.completed_count)
                .then(b.claimed_count.cmp(&a.claimed_count))
                .then(a.user_id.cmp(&b.user_id))
        });
        Ok(stats)
    }
}

/// Fallback label when an actor no longer resolves to a user row.
fn truncated_id(user_id: &str) -> String {
    let prefix: String = user_id.chars().take(8).collect();
    format!("{prefix}...")
}
