// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Card button handlers.
//!
//! Buttons only ever appear for transitions that were legal when the card
//! was rendered; permissions and current state are re-checked here at
//! click time, so a stale card produces a clean error instead of a bad
//! transition.

use pitcrew_core::PitcrewError;
use pitcrew_orders::OrderService;
use pitcrew_storage::queries;
use serenity::all::{
    ComponentInteraction, Context, CreateInteractionResponse, CreateInteractionResponseMessage,
};
use tracing::warn;

use crate::card::{self, CardAction};
use crate::handlers::{participant_names, resolve_actor};

/// Dispatch a button click to the matching lifecycle transition.
pub async fn dispatch(ctx: &Context, interaction: &ComponentInteraction, service: &OrderService) {
    let Some((action, wo_id)) = card::parse_custom_id(&interaction.data.custom_id) else {
        return;
    };

    match run_action(ctx, interaction, service, action, wo_id).await {
        Ok(()) => {}
        Err(e) => {
            let response = CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(e.to_string())
                    .ephemeral(true),
            );
            if let Err(e) = interaction.create_response(&ctx.http, response).await {
                warn!(error = %e, "failed to send button error response");
            }
        }
    }
}

async fn run_action(
    ctx: &Context,
    interaction: &ComponentInteraction,
    service: &OrderService,
    action: CardAction,
    wo_id: &str,
) -> Result<(), PitcrewError> {
    let guild_id = interaction
        .guild_id
        .map(|g| g.to_string())
        .ok_or_else(|| PitcrewError::Validation("buttons only work inside a server".into()))?;
    let roles = interaction
        .member
        .as_ref()
        .map(|m| m.roles.clone())
        .unwrap_or_default();
    let actor = resolve_actor(service, &guild_id, &interaction.user, &roles).await?;

    let wo = match action {
        CardAction::Claim => service.claim(&actor, wo_id).await?,
        CardAction::Unclaim => service.unclaim(&actor, wo_id).await?,
        CardAction::MarkDone => service.finish(&actor, wo_id).await?,
        CardAction::Cancel => service.cancel(&actor, wo_id).await?,
    };

    // Re-render the card in place with the new state and button set.
    let subsystem = queries::subsystems::get(service.db(), &wo.subsystem_id).await?;
    let names = participant_names(service, &wo).await;
    let embed = card::build_embed(&wo, subsystem.as_ref(), &names);
    let components = card::build_buttons(&wo);

    interaction
        .create_response(
            &ctx.http,
            CreateInteractionResponse::UpdateMessage(
                CreateInteractionResponseMessage::new()
                    .embed(embed)
                    .components(components),
            ),
        )
        .await
        .map_err(|e| PitcrewError::Channel {
            message: "failed to update card message".into(),
            source: Some(Box::new(e)),
        })?;
    Ok(())
}
