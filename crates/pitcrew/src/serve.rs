// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `pitcrew serve` command implementation.
//!
//! Opens the database, builds the shared `OrderService`, and runs the
//! enabled front-ends (Discord bot, web API) until one of them exits or
//! the process receives Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use pitcrew_config::PitcrewConfig;
use pitcrew_core::PitcrewError;
use pitcrew_orders::cache::SubsystemCacheConfig;
use pitcrew_orders::OrderService;
use pitcrew_storage::Database;
use pitcrew_web::auth::AuthConfig;
use pitcrew_web::server::ServerConfig;
use pitcrew_web::AppState;
use tracing::{error, info, warn};

/// Runs the `pitcrew serve` command.
pub async fn run_serve(config: PitcrewConfig) -> Result<(), PitcrewError> {
    init_tracing(&config.bot.log_level);

    info!("starting pitcrew serve");

    let db = Arc::new(
        Database::open_with(&config.storage.database_path, config.storage.wal_mode).await?,
    );
    let service = Arc::new(OrderService::new(
        db,
        SubsystemCacheConfig {
            ttl: Duration::from_secs(config.cache.subsystem_ttl_secs),
            refresh_timeout: Duration::from_millis(config.cache.refresh_timeout_ms),
        },
    ));

    let mut tasks: Vec<(&'static str, tokio::task::JoinHandle<()>)> = Vec::new();

    if config.web.enabled {
        if config.web.bearer_token.is_none() {
            warn!("web.bearer_token is not set -- the API will reject all requests");
        }
        let state = AppState {
            service: Arc::clone(&service),
            auth: AuthConfig {
                bearer_token: config.web.bearer_token.clone(),
            },
        };
        let server_config = ServerConfig {
            host: config.web.host.clone(),
            port: config.web.port,
        };
        tasks.push((
            "web",
            tokio::spawn(async move {
                if let Err(e) = pitcrew_web::server::start_server(&server_config, state).await {
                    error!(error = %e, "web API server exited");
                }
            }),
        ));
    }

    if let Some(token) = config.bot.discord_token.clone() {
        let service = Arc::clone(&service);
        tasks.push((
            "discord",
            tokio::spawn(async move {
                if let Err(e) = pitcrew_discord::run(&token, service).await {
                    error!(error = %e, "discord bot exited");
                }
            }),
        ));
    } else {
        info!("bot.discord_token not set -- discord front-end disabled");
    }

    if tasks.is_empty() {
        return Err(PitcrewError::Config(
            "nothing to serve: enable the web API or set bot.discord_token".into(),
        ));
    }

    tokio::signal::ctrl_c().await.map_err(|e| PitcrewError::Channel {
        message: "failed to listen for shutdown signal".into(),
        source: Some(Box::new(e)),
    })?;
    info!("shutdown signal received");

    for (name, task) in tasks {
        task.abort();
        info!(front_end = name, "stopped");
    }
    Ok(())
}

/// Initialize the tracing subscriber from the configured log level, with
/// `RUST_LOG` taking precedence when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pitcrew={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
