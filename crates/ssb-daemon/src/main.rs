//! ssb-daemon entry point.
//!
//! Thin: load config and secrets, pick the store backend, build the shared
//! state, wire middleware, serve. Route handlers live in `routes.rs`; shared
//! state types in `state.rs`.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use ssb_config::{
    load_layered_yaml, paths_from_env, report_unused_keys, secrets::resolve_secrets, Component,
    DashboardConfig, StoreBackend, UnusedKeyPolicy,
};
use ssb_daemon::{routes, state};
use ssb_inventory::{LiveStore, LocalAccountService};
use ssb_store::{MemoryStore, RestStore};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let paths = paths_from_env();
    let path_refs: Vec<&str> = paths.iter().map(String::as_str).collect();
    let loaded = load_layered_yaml(&path_refs)?;
    let report = report_unused_keys(Component::Daemon, &loaded.config_json, UnusedKeyPolicy::Warn)?;
    for ptr in &report.unused_leaf_pointers {
        warn!(pointer = %ptr, "unused config key");
    }
    let cfg = loaded.dashboard()?;
    let secrets = resolve_secrets(&cfg)?;
    info!(config_hash = %loaded.config_hash, layers = paths.len(), "config loaded");

    let store = build_store(&cfg, secrets.store_auth_token.clone());
    let accounts = Arc::new(LocalAccountService::new(chrono::Duration::hours(
        cfg.accounts.session_ttl_hours,
    )));
    let shared = Arc::new(state::AppState::new(
        store,
        accounts,
        secrets.initial_password.clone(),
    ));

    if let (Some(email), Some(password)) = (
        cfg.accounts.bootstrap_admin_email.as_deref(),
        secrets.bootstrap_admin_password.as_deref(),
    ) {
        shared
            .bootstrap_admin(email, password)
            .await
            .context("bootstrap admin failed")?;
    }

    state::spawn_heartbeat(shared.bus.clone(), Duration::from_secs(1));
    let feed = state::start_synthesis_feed(&shared)
        .await
        .context("synthesis feed failed to start")?;

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr = bind_addr(&cfg)?;
    info!("ssb-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    feed.stop();
    info!("ssb-daemon stopped");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn build_store(cfg: &DashboardConfig, auth_token: Option<String>) -> Arc<dyn LiveStore> {
    match cfg.store.backend {
        StoreBackend::Memory => {
            warn!("memory store backend: data is lost on restart");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Rest => {
            // DashboardConfig validation guarantees the URL for this backend.
            let url = cfg.store.database_url.clone().unwrap_or_default();
            Arc::new(
                RestStore::new(url, auth_token)
                    .with_poll_interval(Duration::from_millis(cfg.store.poll_interval_ms)),
            )
        }
    }
}

/// `SSB_DAEMON_ADDR` overrides `server.bind_addr`.
fn bind_addr(cfg: &DashboardConfig) -> anyhow::Result<SocketAddr> {
    let raw = std::env::var("SSB_DAEMON_ADDR").unwrap_or_else(|_| cfg.server.bind_addr.clone());
    raw.parse()
        .with_context(|| format!("invalid bind address: {raw}"))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available: run until killed.
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(tower_http::cors::Any)
}
