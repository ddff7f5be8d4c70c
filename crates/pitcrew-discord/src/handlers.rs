// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash-command handlers.
//!
//! Each handler resolves the acting identity (upserting the user row),
//! extracts options, calls the lifecycle service, and renders the result.
//! No lifecycle logic lives here.

use std::str::FromStr;

use pitcrew_core::types::is_admin;
use pitcrew_core::{ActorContext, PitcrewError, Priority, WorkOrder, WorkOrderUpdate};
use pitcrew_orders::{CreateWorkOrder, OrderService};
use pitcrew_storage::queries;
use serenity::all::{
    ChannelId, CommandInteraction, Context, CreateEmbed, CreateMessage, EditInteractionResponse,
    EditMessage, MessageId, RoleId, User as DiscordUser, UserId,
};
use tracing::{debug, warn};

use crate::card::{self, ParticipantNames};

/// Resolve the acting identity for an interaction: upsert the user row and
/// derive the admin flag from member roles against the guild config.
pub async fn resolve_actor(
    service: &OrderService,
    guild_id: &str,
    discord_user: &DiscordUser,
    member_role_ids: &[RoleId],
) -> Result<ActorContext, PitcrewError> {
    let user = queries::users::upsert(
        service.db(),
        &discord_user.id.to_string(),
        &discord_user.name,
        discord_user.avatar_url().as_deref(),
    )
    .await?;

    let roles: Vec<String> = member_role_ids.iter().map(|r| r.to_string()).collect();
    let config = queries::guild_configs::get(service.db(), guild_id).await?;
    let admin = config.as_ref().is_some_and(|c| is_admin(&roles, c));

    Ok(ActorContext::new(user.id, guild_id.to_string(), admin))
}

/// Require the interaction to come from a guild.
pub fn require_guild(interaction: &CommandInteraction) -> Result<String, PitcrewError> {
    interaction
        .guild_id
        .map(|g| g.to_string())
        .ok_or_else(|| PitcrewError::Validation("this command only works inside a server".into()))
}

fn member_roles(interaction: &CommandInteraction) -> Vec<RoleId> {
    interaction
        .member
        .as_ref()
        .map(|m| m.roles.clone())
        .unwrap_or_default()
}

fn opt_str<'a>(interaction: &'a CommandInteraction, name: &str) -> Option<&'a str> {
    interaction
        .data
        .options
        .iter()
        .find(|o| o.name == name)
        .and_then(|o| o.value.as_str())
}

fn opt_user_id(interaction: &CommandInteraction, name: &str) -> Option<UserId> {
    interaction
        .data
        .options
        .iter()
        .find(|o| o.name == name)
        .and_then(|o| o.value.as_user_id())
}

fn required_opt<'a>(
    interaction: &'a CommandInteraction,
    name: &'static str,
) -> Result<&'a str, PitcrewError> {
    opt_str(interaction, name)
        .ok_or_else(|| PitcrewError::Validation(format!("missing required option `{name}`")))
}

fn parse_priority(raw: Option<&str>) -> Result<Priority, PitcrewError> {
    match raw {
        None => Ok(Priority::Medium),
        Some(raw) => Priority::from_str(raw)
            .map_err(|_| PitcrewError::Validation(format!("unknown priority `{raw}`"))),
    }
}

/// Resolve display names for the users a card references.
pub async fn participant_names(service: &OrderService, wo: &WorkOrder) -> ParticipantNames {
    let mut ids = vec![wo.created_by_user_id.clone()];
    ids.extend(wo.claimed_by_user_id.clone());
    ids.extend(wo.assigned_to_user_id.clone());

    match queries::users::display_names(service.db(), &ids).await {
        Ok(names) => ParticipantNames {
            creator: names.get(&wo.created_by_user_id).cloned(),
            claimer: wo
                .claimed_by_user_id
                .as_ref()
                .and_then(|id| names.get(id).cloned()),
            assignee: wo
                .assigned_to_user_id
                .as_ref()
                .and_then(|id| names.get(id).cloned()),
        },
        Err(e) => {
            debug!(error = %e, "failed to resolve participant names");
            ParticipantNames::default()
        }
    }
}

/// Edit the posted card message to reflect the work order's current state.
/// Best-effort: the message may have been deleted by a moderator.
pub async fn refresh_card(ctx: &Context, service: &OrderService, wo: &WorkOrder) {
    let (Some(message_id), Some(channel_id)) = (&wo.discord_message_id, &wo.discord_channel_id)
    else {
        return;
    };
    let (Ok(message_id), Ok(channel_id)) = (message_id.parse::<u64>(), channel_id.parse::<u64>())
    else {
        warn!(id = %wo.id, "work order carries malformed discord card references");
        return;
    };

    let subsystem = queries::subsystems::get(service.db(), &wo.subsystem_id)
        .await
        .ok()
        .flatten();
    let names = participant_names(service, wo).await;
    let embed = card::build_embed(wo, subsystem.as_ref(), &names);
    let components = card::build_buttons(wo);

    if let Err(e) = ChannelId::new(channel_id)
        .edit_message(
            &ctx.http,
            MessageId::new(message_id),
            EditMessage::new().embed(embed).components(components),
        )
        .await
    {
        warn!(error = %e, id = %wo.id, "failed to update work order card");
    }
}

/// Post a fresh card to the guild's configured work-orders channel and
/// persist the message location. Best-effort.
async fn post_card(ctx: &Context, service: &OrderService, wo: &WorkOrder) {
    let config = match queries::guild_configs::get(service.db(), &wo.guild_id).await {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "failed to load guild config for card posting");
            return;
        }
    };
    let Some(channel_id) = config.and_then(|c| c.work_orders_channel_id) else {
        return;
    };
    let Ok(channel_id) = channel_id.parse::<u64>() else {
        warn!(guild = %wo.guild_id, "configured work-orders channel id is not numeric");
        return;
    };

    let subsystem = queries::subsystems::get(service.db(), &wo.subsystem_id)
        .await
        .ok()
        .flatten();
    let names = participant_names(service, wo).await;
    let embed = card::build_embed(wo, subsystem.as_ref(), &names);
    let components = card::build_buttons(wo);

    let mentions = card::mention_line(wo);
    let mut message = CreateMessage::new().embed(embed).components(components);
    if !mentions.is_empty() {
        message = message.content(mentions);
    }

    match ChannelId::new(channel_id).send_message(&ctx.http, message).await {
        Ok(posted) => {
            if let Err(e) = queries::work_orders::set_discord_refs(
                service.db(),
                &wo.id,
                &posted.id.to_string(),
                &channel_id.to_string(),
            )
            .await
            {
                warn!(error = %e, id = %wo.id, "failed to save card message reference");
            }
        }
        Err(e) => warn!(error = %e, id = %wo.id, "failed to post work order card"),
    }
}

async fn edit_reply(ctx: &Context, interaction: &CommandInteraction, content: String) {
    if let Err(e) = interaction
        .edit_response(&ctx.http, EditInteractionResponse::new().content(content))
        .await
    {
        warn!(error = %e, "failed to edit interaction response");
    }
}

/// `/wo-create` -- create a work order and post its card.
pub async fn handle_create(
    ctx: &Context,
    interaction: &CommandInteraction,
    service: &OrderService,
) -> Result<(), PitcrewError> {
    let guild_id = require_guild(interaction)?;
    let actor =
        resolve_actor(service, &guild_id, &interaction.user, &member_roles(interaction)).await?;

    let req = CreateWorkOrder {
        title: required_opt(interaction, "title")?.to_string(),
        description: opt_str(interaction, "description").unwrap_or_default().to_string(),
        subsystem_id: required_opt(interaction, "subsystem")?.to_string(),
        priority: parse_priority(opt_str(interaction, "priority"))?,
        cad_link: opt_str(interaction, "cad-link").map(str::to_string),
        notify_user_ids: vec![],
        notify_role_ids: vec![],
    };
    let wo = service.create(&actor, req).await?;

    post_card(ctx, service, &wo).await;

    // Reply with the full card so the creator can immediately claim it.
    let wo = service.get(&actor, &wo.id).await?;
    let subsystem = queries::subsystems::get(service.db(), &wo.subsystem_id).await?;
    let names = participant_names(service, &wo).await;
    let embed: CreateEmbed = card::build_embed(&wo, subsystem.as_ref(), &names);
    let components = card::build_buttons(&wo);
    interaction
        .edit_response(
            &ctx.http,
            EditInteractionResponse::new().embed(embed).components(components),
        )
        .await
        .map_err(|e| PitcrewError::Channel {
            message: "failed to send create reply".into(),
            source: Some(Box::new(e)),
        })?;
    Ok(())
}

/// Shared shape of the single-target transitions (`/wo-claim`,
/// `/wo-unclaim`, `/wo-finish`, `/wo-cancel`, `/wo-remove`).
async fn handle_transition(
    ctx: &Context,
    interaction: &CommandInteraction,
    service: &OrderService,
    verb: &str,
) -> Result<(), PitcrewError> {
    let guild_id = require_guild(interaction)?;
    let actor =
        resolve_actor(service, &guild_id, &interaction.user, &member_roles(interaction)).await?;
    let id = required_opt(interaction, "id")?;

    let (wo, past) = match verb {
        "claim" => (service.claim(&actor, id).await?, "claimed"),
        "unclaim" => (service.unclaim(&actor, id).await?, "unclaimed"),
        "finish" => (service.finish(&actor, id).await?, "marked done"),
        "cancel" => (service.cancel(&actor, id).await?, "cancelled"),
        "remove" => (service.remove(&actor, id).await?, "removed"),
        _ => unreachable!("unknown transition verb"),
    };

    refresh_card(ctx, service, &wo).await;
    edit_reply(ctx, interaction, format!("Work order **{}** {past}.", wo.title)).await;
    Ok(())
}

pub async fn handle_claim(
    ctx: &Context,
    interaction: &CommandInteraction,
    service: &OrderService,
) -> Result<(), PitcrewError> {
    handle_transition(ctx, interaction, service, "claim").await
}

pub async fn handle_unclaim(
    ctx: &Context,
    interaction: &CommandInteraction,
    service: &OrderService,
) -> Result<(), PitcrewError> {
    handle_transition(ctx, interaction, service, "unclaim").await
}

pub async fn handle_finish(
    ctx: &Context,
    interaction: &CommandInteraction,
    service: &OrderService,
) -> Result<(), PitcrewError> {
    handle_transition(ctx, interaction, service, "finish").await
}

pub async fn handle_cancel(
    ctx: &Context,
    interaction: &CommandInteraction,
    service: &OrderService,
) -> Result<(), PitcrewError> {
    handle_transition(ctx, interaction, service, "cancel").await
}

pub async fn handle_remove(
    ctx: &Context,
    interaction: &CommandInteraction,
    service: &OrderService,
) -> Result<(), PitcrewError> {
    handle_transition(ctx, interaction, service, "remove").await
}

/// `/wo-assign` -- admin assigns a member to a work order.
pub async fn handle_assign(
    ctx: &Context,
    interaction: &CommandInteraction,
    service: &OrderService,
) -> Result<(), PitcrewError> {
    let guild_id = require_guild(interaction)?;
    let actor =
        resolve_actor(service, &guild_id, &interaction.user, &member_roles(interaction)).await?;
    let id = required_opt(interaction, "id")?;
    let target = opt_user_id(interaction, "member")
        .ok_or_else(|| PitcrewError::Validation("missing required option `member`".into()))?;

    // Register the assignee so the internal user row exists.
    let resolved = interaction.data.resolved.users.get(&target);
    let assignee = match resolved {
        Some(user) => {
            queries::users::upsert(
                service.db(),
                &user.id.to_string(),
                &user.name,
                user.avatar_url().as_deref(),
            )
            .await?
        }
        None => queries::users::get_by_discord_id(service.db(), &target.to_string())
            .await?
            .ok_or(PitcrewError::NotFound {
                what: "user",
                id: target.to_string(),
            })?,
    };

    let wo = service.assign(&actor, id, &assignee.id).await?;
    refresh_card(ctx, service, &wo).await;
    edit_reply(
        ctx,
        interaction,
        format!("Work order **{}** assigned to {}.", wo.title, assignee.display_name),
    )
    .await;
    Ok(())
}

/// `/wo-edit` -- partial edit of title/description/priority/subsystem/CAD link.
pub async fn handle_edit(
    ctx: &Context,
    interaction: &CommandInteraction,
    service: &OrderService,
) -> Result<(), PitcrewError> {
    let guild_id = require_guild(interaction)?;
    let actor =
        resolve_actor(service, &guild_id, &interaction.user, &member_roles(interaction)).await?;
    let id = required_opt(interaction, "id")?;

    let update = WorkOrderUpdate {
        title: opt_str(interaction, "title").map(str::to_string),
        description: opt_str(interaction, "description").map(str::to_string),
        priority: opt_str(interaction, "priority")
            .map(|raw| parse_priority(Some(raw)))
            .transpose()?,
        subsystem_id: opt_str(interaction, "subsystem").map(str::to_string),
        cad_link: opt_str(interaction, "cad-link").map(str::to_string),
    };

    let wo = service.edit(&actor, id, update).await?;
    refresh_card(ctx, service, &wo).await;
    edit_reply(ctx, interaction, format!("Work order **{}** updated.", wo.title)).await;
    Ok(())
}

/// `/wo-list` -- ephemeral listing of open work orders, newest first.
pub async fn handle_list(
    ctx: &Context,
    interaction: &CommandInteraction,
    service: &OrderService,
) -> Result<(), PitcrewError> {
    let guild_id = require_guild(interaction)?;
    let orders = service.list_open(&guild_id).await?;

    if orders.is_empty() {
        edit_reply(ctx, interaction, "No open work orders.".to_string()).await;
        return Ok(());
    }

    let claimer_ids: Vec<String> = orders
        .iter()
        .filter_map(|wo| wo.claimed_by_user_id.clone())
        .collect();
    let names = queries::users::display_names(service.db(), &claimer_ids).await?;

    let mut description = String::new();
    for (idx, wo) in orders.iter().take(10).enumerate() {
        description.push_str(&format!(
            "**{}.** {} {}\n   ID: `{}`\n   Priority: {}\n",
            idx + 1,
            card::priority_emoji(wo.priority),
            wo.title,
            wo.id,
            wo.priority.label(),
        ));
        if let Some(claimer) = &wo.claimed_by_user_id {
            let name = names.get(claimer).map(String::as_str).unwrap_or("Unknown");
            description.push_str(&format!("   Claimed by: {name}\n"));
        }
        description.push('\n');
    }
    if orders.len() > 10 {
        description.push_str(&format!(
            "... and {} more. View all in the dashboard.",
            orders.len() - 10
        ));
    }

    let embed = CreateEmbed::new()
        .colour(serenity::all::Colour::new(0x00F1_C40F))
        .title("Open Work Orders")
        .description(description);
    interaction
        .edit_response(&ctx.http, EditInteractionResponse::new().embed(embed))
        .await
        .map_err(|e| PitcrewError::Channel {
            message: "failed to send list reply".into(),
            source: Some(Box::new(e)),
        })?;
    Ok(())
}
