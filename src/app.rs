/*
 * Responsibility
 * - Load Config → build dependencies → assemble Router
 * - Apply middleware (HTTP layers, DPoP on protected routes)
 * - Background replay sweep
 * - Start axum::serve()
 */
use std::{panic, process, time::Duration};

use anyhow::Result;
use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware;
use crate::services::{DpopService, build_dpop_service};
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG wins when set, e.g. RUST_LOG=info,dpop_binding=debug,tower_http=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development: crash loudly. Production: default hook, keep serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting DPoP API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    if config.app_env.is_production() && config.trusts_forwarded_headers() {
        tracing::warn!(
            "PUBLIC_BASE_URL is unset; expected htu will follow x-forwarded-host / Host"
        );
    }

    let state = build_state(&config);
    spawn_replay_sweep(
        state.dpop.clone(),
        Duration::from_secs(config.dpop_replay_sweep_interval_seconds),
    );

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_state(config: &Config) -> AppState {
    AppState::new(build_dpop_service(config))
}

pub fn build_router(state: AppState) -> Router {
    let app = Router::new()
        .route("/health", get(api::v1::handlers::health::health))
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state);

    middleware::http::apply(app)
}

fn spawn_replay_sweep(dpop: std::sync::Arc<DpopService>, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let purged = dpop.purge_expired_replays();
            if purged > 0 {
                tracing::debug!(purged, "replay window swept");
            }
        }
    });
}
