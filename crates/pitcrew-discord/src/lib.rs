// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discord front-end for the Pitcrew work-order tracker.
//!
//! Slash commands and card buttons are thin shells over the shared
//! `OrderService`: resolve the actor, call the lifecycle operation, render
//! the result. The card embed and button set are re-rendered after every
//! transition.

pub mod autocomplete;
pub mod buttons;
pub mod card;
pub mod commands;
pub mod handlers;

use std::sync::Arc;

use pitcrew_core::PitcrewError;
use pitcrew_orders::OrderService;
use serenity::all::{
    Client, Command, CommandInteraction, Context, EventHandler, GatewayIntents, Interaction, Ready,
};
use serenity::async_trait;
use tracing::{error, info, warn};

struct Handler {
    service: Arc<OrderService>,
}

impl Handler {
    async fn dispatch_command(&self, ctx: &Context, interaction: &CommandInteraction) {
        // Defer up front; every handler replies by editing the response.
        let defer_result = match interaction.data.name.as_str() {
            "wo-create" => interaction.defer(&ctx.http).await,
            _ => interaction.defer_ephemeral(&ctx.http).await,
        };
        if let Err(e) = defer_result {
            warn!(error = %e, command = %interaction.data.name, "failed to defer interaction");
            return;
        }

        let service = &self.service;
        let result = match interaction.data.name.as_str() {
            "wo-create" => handlers::handle_create(ctx, interaction, service).await,
            "wo-edit" => handlers::handle_edit(ctx, interaction, service).await,
            "wo-claim" => handlers::handle_claim(ctx, interaction, service).await,
            "wo-unclaim" => handlers::handle_unclaim(ctx, interaction, service).await,
            "wo-finish" => handlers::handle_finish(ctx, interaction, service).await,
            "wo-cancel" => handlers::handle_cancel(ctx, interaction, service).await,
            "wo-assign" => handlers::handle_assign(ctx, interaction, service).await,
            "wo-remove" => handlers::handle_remove(ctx, interaction, service).await,
            "wo-list" => handlers::handle_list(ctx, interaction, service).await,
            other => {
                warn!(command = other, "unknown command");
                return;
            }
        };

        if let Err(e) = result {
            let edit = serenity::all::EditInteractionResponse::new().content(e.to_string());
            if let Err(e) = interaction.edit_response(&ctx.http, edit).await {
                warn!(error = %e, "failed to report command error");
            }
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, "discord bot connected");
        match Command::set_global_commands(&ctx.http, commands::definitions()).await {
            Ok(registered) => info!(count = registered.len(), "slash commands registered"),
            Err(e) => error!(error = %e, "failed to register slash commands"),
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => self.dispatch_command(&ctx, &command).await,
            Interaction::Autocomplete(command) => {
                autocomplete::respond(&ctx, &command, &self.service).await;
            }
            Interaction::Component(component) => {
                buttons::dispatch(&ctx, &component, &self.service).await;
            }
            _ => {}
        }
    }
}

/// Run the Discord bot until the gateway connection ends.
pub async fn run(token: &str, service: Arc<OrderService>) -> Result<(), PitcrewError> {
    let mut client = Client::builder(token, GatewayIntents::GUILDS)
        .event_handler(Handler { service })
        .await
        .map_err(|e| PitcrewError::Channel {
            message: "failed to build discord client".into(),
            source: Some(Box::new(e)),
        })?;

    client.start().await.map_err(|e| PitcrewError::Channel {
        message: "discord gateway error".into(),
        source: Some(Box::new(e)),
    })
}
