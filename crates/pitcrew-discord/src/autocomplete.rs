// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subsystem autocomplete for the `subsystem` command option.
//!
//! Served from the TTL cache so keystrokes never hammer the store; the
//! filter itself is a pure single-pass function.

use pitcrew_core::Subsystem;
use pitcrew_orders::OrderService;
use serenity::all::{CommandInteraction, Context, CreateAutocompleteResponse, CreateInteractionResponse};
use tracing::debug;

/// Discord caps autocomplete responses at 25 choices.
pub const MAX_CHOICES: usize = 25;

/// Case-insensitive prefix-then-substring match on display name and name.
pub fn filter_subsystems<'a>(subsystems: &'a [Subsystem], query: &str) -> Vec<&'a Subsystem> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return subsystems.iter().take(MAX_CHOICES).collect();
    }

    let mut prefix_matches = Vec::new();
    let mut substring_matches = Vec::new();
    for sub in subsystems {
        let display = sub.display_name.to_lowercase();
        let name = sub.name.to_lowercase();
        if display.starts_with(&query) || name.starts_with(&query) {
            prefix_matches.push(sub);
        } else if display.contains(&query) || name.contains(&query) {
            substring_matches.push(sub);
        }
    }
    prefix_matches.extend(substring_matches);
    prefix_matches.truncate(MAX_CHOICES);
    prefix_matches
}

/// Respond to an autocomplete interaction for the `subsystem` option.
pub async fn respond(
    ctx: &Context,
    interaction: &CommandInteraction,
    service: &OrderService,
) {
    let Some(guild_id) = interaction.guild_id else {
        return;
    };
    let query = interaction
        .data
        .autocomplete()
        .map(|opt| opt.value.to_string())
        .unwrap_or_default();

    let subsystems = service.subsystems().get(&guild_id.to_string()).await;
    let mut response = CreateAutocompleteResponse::new();
    for sub in filter_subsystems(&subsystems, &query) {
        response = response.add_string_choice(sub.display_name.clone(), sub.id.clone());
    }

    if let Err(e) = interaction
        .create_response(&ctx.http, CreateInteractionResponse::Autocomplete(response))
        .await
    {
        debug!(error = %e, "failed to send autocomplete response");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(name: &str, display: &str) -> Subsystem {
        Subsystem {
            id: format!("sub-{name}"),
            guild_id: "g1".into(),
            name: name.into(),
            display_name: display.into(),
            emoji: String::new(),
            color: "#999999".into(),
            sort_order: 0,
        }
    }

    #[test]
    fn empty_query_returns_everything_in_order() {
        let subs = vec![sub("drivetrain", "Drivetrain"), sub("arm", "Arm")];
        let filtered = filter_subsystems(&subs, "");
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].name, "drivetrain");
    }

    #[test]
    fn prefix_matches_rank_before_substring_matches() {
        let subs = vec![
            sub("bumpers", "Bumpers"),
            sub("arm", "Arm"),
            sub("alarm", "Alarm Panel"),
        ];
        let filtered = filter_subsystems(&subs, "ar");
        let names: Vec<&str> = filtered.iter().map(|s| s.name.as_str()).collect();
        // "arm" and "alarm" prefix-match; "bumpers" does not match at all.
        assert_eq!(names, vec!["arm", "alarm"]);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let subs = vec![sub("drivetrain", "Drivetrain")];
        assert_eq!(filter_subsystems(&subs, "DRIVE").len(), 1);
        assert_eq!(filter_subsystems(&subs, "train").len(), 1);
        assert_eq!(filter_subsystems(&subs, "xyz").len(), 0);
    }

    #[test]
    fn results_are_capped_at_discord_limit() {
        let subs: Vec<Subsystem> = (0..40).map(|i| sub(&format!("s{i}"), "Sub")).collect();
        assert_eq!(filter_subsystems(&subs, "").len(), MAX_CHOICES);
        assert_eq!(filter_subsystems(&subs, "s").len(), MAX_CHOICES);
    }
}
