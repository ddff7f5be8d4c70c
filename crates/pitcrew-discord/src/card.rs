// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Work-order card rendering: embed plus contextual action buttons.
//!
//! Button visibility is derived from one pure `legal_actions` function so
//! the card can never offer a transition the lifecycle layer would
//! reject outright. Permissions are still re-checked at click time.

use pitcrew_core::{Priority, Subsystem, WorkOrder, WorkOrderStatus};
use serenity::all::{
    ButtonStyle, Colour, CreateActionRow, CreateButton, CreateEmbed, CreateEmbedFooter, Timestamp,
};

/// Actions that can appear as buttons on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    Claim,
    Unclaim,
    MarkDone,
    Cancel,
}

impl CardAction {
    pub fn custom_id_prefix(&self) -> &'static str {
        match self {
            CardAction::Claim => "claim",
            CardAction::Unclaim => "unclaim",
            CardAction::MarkDone => "done",
            CardAction::Cancel => "cancel",
        }
    }
}

/// Display names for the participants referenced by a card.
#[derive(Debug, Clone, Default)]
pub struct ParticipantNames {
    pub creator: Option<String>,
    pub claimer: Option<String>,
    pub assignee: Option<String>,
}

/// The transitions currently legal from this card's state. Buttons exist
/// only for these.
pub fn legal_actions(wo: &WorkOrder) -> Vec<CardAction> {
    if wo.is_deleted || wo.status != WorkOrderStatus::Open {
        return Vec::new();
    }
    let mut actions = Vec::new();
    if wo.claimed_by_user_id.is_none() {
        actions.push(CardAction::Claim);
    } else {
        actions.push(CardAction::Unclaim);
        actions.push(CardAction::MarkDone);
    }
    actions.push(CardAction::Cancel);
    actions
}

/// Parse a button custom id of the form `<action>:<work order id>`.
pub fn parse_custom_id(custom_id: &str) -> Option<(CardAction, &str)> {
    let (prefix, id) = custom_id.split_once(':')?;
    if id.is_empty() {
        return None;
    }
    let action = match prefix {
        "claim" => CardAction::Claim,
        "unclaim" => CardAction::Unclaim,
        "done" => CardAction::MarkDone,
        "cancel" => CardAction::Cancel,
        _ => return None,
    };
    Some((action, id))
}

pub fn priority_emoji(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "🟢",
        Priority::Medium => "🟡",
        Priority::High => "🔴",
    }
}

/// Card color: priority-driven while open, green when done, grey when
/// cancelled, red when removed.
pub fn card_colour(wo: &WorkOrder) -> Colour {
    if wo.is_deleted {
        return Colour::new(0x00FF_0000);
    }
    match wo.status {
        WorkOrderStatus::Open => match wo.priority {
            Priority::High => Colour::new(0x00E7_4C3C),
            Priority::Medium => Colour::new(0x00F1_C40F),
            Priority::Low => Colour::new(0x002E_CC71),
        },
        WorkOrderStatus::Done => Colour::new(0x0000_AA00),
        WorkOrderStatus::Cancelled => Colour::new(0x0095_A5A6),
    }
}

/// The embed title line: `{emoji} [{subsystem}] {title}`.
pub fn title_line(wo: &WorkOrder, subsystem: Option<&Subsystem>) -> String {
    let label = subsystem.map_or("Unknown", |s| s.display_name.as_str());
    match subsystem.map(|s| s.emoji.as_str()).filter(|e| !e.is_empty()) {
        Some(emoji) => format!("{emoji} [{label}] {}", wo.title),
        None => format!("[{label}] {}", wo.title),
    }
}

/// Build the card embed for a work order.
pub fn build_embed(
    wo: &WorkOrder,
    subsystem: Option<&Subsystem>,
    names: &ParticipantNames,
) -> CreateEmbed {
    let subsystem_label = subsystem.map_or("Unknown", |s| s.display_name.as_str());
    let description = if wo.description.is_empty() {
        "*No description provided*".to_string()
    } else {
        wo.description.clone()
    };

    let mut embed = CreateEmbed::new()
        .colour(card_colour(wo))
        .title(title_line(wo, subsystem))
        .description(description)
        .field("Status", wo.status.label(), true)
        .field(
            "Priority",
            format!("{} {}", priority_emoji(wo.priority), wo.priority.label()),
            true,
        )
        .field("Subsystem", subsystem_label, true);

    if let Some(creator) = &names.creator {
        embed = embed.field("Created By", creator.clone(), true);
    }
    if let Some(claimer) = &names.claimer {
        embed = embed.field("Claimed By", claimer.clone(), true);
    }
    if let Some(assignee) = &names.assignee {
        embed = embed.field("Assigned To", assignee.clone(), true);
    }
    if let Some(link) = &wo.cad_link {
        embed = embed.field("CAD Link", format!("[Open CAD]({link})"), false);
    }
    if wo.status == WorkOrderStatus::Cancelled {
        embed = embed.field("Cancelled", "This work order has been cancelled.", false);
    }
    if wo.is_deleted {
        embed = embed.field("Removed", "This work order has been removed by an admin.", false);
    }

    embed = embed.footer(CreateEmbedFooter::new(format!("ID: {}", wo.id)));
    if let Ok(ts) = Timestamp::parse(&wo.created_at) {
        embed = embed.timestamp(ts);
    }
    embed
}

/// Build the action rows for a card. Empty when no transition is legal.
pub fn build_buttons(wo: &WorkOrder) -> Vec<CreateActionRow> {
    let actions = legal_actions(wo);
    if actions.is_empty() {
        return Vec::new();
    }
    let buttons: Vec<CreateButton> = actions
        .iter()
        .map(|action| {
            let custom_id = format!("{}:{}", action.custom_id_prefix(), wo.id);
            match action {
                CardAction::Claim => CreateButton::new(custom_id)
                    .label("Claim")
                    .style(ButtonStyle::Primary),
                CardAction::Unclaim => CreateButton::new(custom_id)
                    .label("Unclaim")
                    .style(ButtonStyle::Secondary),
                CardAction::MarkDone => CreateButton::new(custom_id)
                    .label("Mark Done")
                    .style(ButtonStyle::Success),
                CardAction::Cancel => CreateButton::new(custom_id)
                    .label("Cancel")
                    .style(ButtonStyle::Danger),
            }
        })
        .collect();
    vec![CreateActionRow::Buttons(buttons)]
}

/// Mention line for notify lists, empty when there is nobody to notify.
pub fn mention_line(wo: &WorkOrder) -> String {
    let mut mentions: Vec<String> = wo.notify_user_ids.iter().map(|id| format!("<@{id}>")).collect();
    mentions.extend(wo.notify_role_ids.iter().map(|id| format!("<@&{id}>")));
    mentions.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_wo() -> WorkOrder {
        WorkOrder {
            id: "wo-1".into(),
            title: "Fix belt".into(),
            description: String::new(),
            subsystem_id: "sub-1".into(),
            priority: Priority::Medium,
            status: WorkOrderStatus::Open,
            created_by_user_id: "creator".into(),
            assigned_to_user_id: None,
            claimed_by_user_id: None,
            discord_message_id: None,
            discord_channel_id: None,
            discord_thread_id: None,
            guild_id: "g1".into(),
            is_deleted: false,
            cleared_at: None,
            cad_link: None,
            notify_user_ids: vec![],
            notify_role_ids: vec![],
            created_at: "2026-01-01T00:00:00.000Z".into(),
            updated_at: "2026-01-01T00:00:00.000Z".into(),
        }
    }

    #[test]
    fn unclaimed_open_card_offers_claim_and_cancel() {
        assert_eq!(
            legal_actions(&open_wo()),
            vec![CardAction::Claim, CardAction::Cancel]
        );
    }

    #[test]
    fn claimed_open_card_offers_unclaim_done_cancel() {
        let mut wo = open_wo();
        wo.claimed_by_user_id = Some("u1".into());
        assert_eq!(
            legal_actions(&wo),
            vec![CardAction::Unclaim, CardAction::MarkDone, CardAction::Cancel]
        );
    }

    #[test]
    fn terminal_and_deleted_cards_offer_nothing() {
        let mut done = open_wo();
        done.status = WorkOrderStatus::Done;
        assert!(legal_actions(&done).is_empty());

        let mut cancelled = open_wo();
        cancelled.status = WorkOrderStatus::Cancelled;
        assert!(legal_actions(&cancelled).is_empty());

        let mut deleted = open_wo();
        deleted.is_deleted = true;
        assert!(legal_actions(&deleted).is_empty());
        assert!(build_buttons(&deleted).is_empty());
    }

    #[test]
    fn custom_ids_round_trip() {
        for action in [
            CardAction::Claim,
            CardAction::Unclaim,
            CardAction::MarkDone,
            CardAction::Cancel,
        ] {
            let custom_id = format!("{}:wo-42", action.custom_id_prefix());
            assert_eq!(parse_custom_id(&custom_id), Some((action, "wo-42")));
        }
    }

    #[test]
    fn malformed_custom_ids_are_rejected() {
        assert_eq!(parse_custom_id("claim"), None);
        assert_eq!(parse_custom_id("claim:"), None);
        assert_eq!(parse_custom_id("explode:wo-1"), None);
    }

    #[test]
    fn title_line_includes_subsystem_and_emoji() {
        let wo = open_wo();
        let sub = Subsystem {
            id: "sub-1".into(),
            guild_id: "g1".into(),
            name: "drivetrain".into(),
            display_name: "Drivetrain".into(),
            emoji: "⚙️".into(),
            color: "#999999".into(),
            sort_order: 0,
        };
        assert_eq!(title_line(&wo, Some(&sub)), "⚙️ [Drivetrain] Fix belt");
        assert_eq!(title_line(&wo, None), "[Unknown] Fix belt");
    }

    #[test]
    fn card_colour_tracks_state() {
        let mut wo = open_wo();
        wo.priority = Priority::High;
        assert_eq!(card_colour(&wo), Colour::new(0x00E7_4C3C));

        wo.status = WorkOrderStatus::Done;
        assert_eq!(card_colour(&wo), Colour::new(0x0000_AA00));

        wo.is_deleted = true;
        assert_eq!(card_colour(&wo), Colour::new(0x00FF_0000));
    }

    #[test]
    fn mention_line_covers_users_and_roles() {
        let mut wo = open_wo();
        assert_eq!(mention_line(&wo), "");

        wo.notify_user_ids = vec!["1".into(), "2".into()];
        wo.notify_role_ids = vec!["9".into()];
        assert_eq!(mention_line(&wo), "<@1> <@2> <@&9>");
    }
}
