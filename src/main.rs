//! Compat list bot entrypoint wiring the relay ingress, the Discord client and the record store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use compat_list_bot::{
    config::AppConfig,
    platform::{
        ChatPlatform,
        discord::{DiscordClient, DiscordConfig},
    },
    routes,
    services::discovery_service,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let discord = DiscordConfig::from_env().context("loading Discord credentials")?;
    let client = DiscordClient::new(discord).context("building Discord client")?;
    let bot_user = client
        .current_user()
        .await
        .context("fetching the bot account")?;
    info!(bot = %bot_user.name, id = bot_user.id, "logged in");

    let app_state = AppState::new(config, Arc::new(client), bot_user);
    if let Err(err) = discovery_service::discover_channels(&app_state).await {
        warn!(error = %err, "channel discovery failed; starting without list channels");
    }

    let app = build_router(app_state.clone());

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting relay ingress");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(app_state.clone()))
        .await
        .context("serving axum")?;

    if !app_state.is_shutting_down() {
        app_state.request_shutdown();
    }
    info!("waiting for the running list update to finish");
    app_state.wait_for_idle().await;

    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C, SIGTERM or the `kill` command and shut the server down gracefully.
async fn shutdown_signal(state: SharedState) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                    _ = state.shutdown_requested() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = state.shutdown_requested() => {},
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = state.shutdown_requested() => {},
        }
    }
    info!("shutting down");
}
