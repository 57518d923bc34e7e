//! reef-daemon entry point.
//!
//! This file is intentionally thin: it sets up tracing, connects the store,
//! runs migrations, wires middleware, and starts the HTTP server. All route
//! handlers live in `routes.rs`; all shared state types live in `state.rs`.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use reef_daemon::{routes, state};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience). Silent if the file does
    // not exist — production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let pool = reef_db::connect_from_env().await?;
    reef_db::migrate(&pool).await?;

    let store = Arc::new(reef_db::PgStore::new(pool.clone()));
    let shared = Arc::new(state::AppState::new(store));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_from_env());

    let addr = bind_addr_from_env().unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8808)));
    info!("reef-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    // The pool outlives every handler; release it once the listener drains.
    pool.close().await;
    info!("reef-daemon shut down");

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var("REEF_DAEMON_ADDR").ok()?.parse().ok()
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install ctrl-c handler");
    }
}

/// CORS: origins from REEF_CORS_ORIGINS (comma-separated), `*` means any.
fn cors_from_env() -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let configured = std::env::var("REEF_CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
    if configured.trim() == "*" {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = configured
        .split(',')
        .filter_map(|o| HeaderValue::from_str(o.trim()).ok())
        .collect();

    layer.allow_origin(origins)
}
