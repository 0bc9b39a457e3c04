// ABOUTME: Server binary: config load, resource wiring, axum serve
// ABOUTME: Seeds the in-memory store and runs until SIGINT
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Veld Explore

//! # Veld Explore Server
//!
//! ```bash
//! # Run with defaults (port 8080, no assistant credential)
//! cargo run --bin veld-explore-server
//!
//! # Override the port and enable the assistant
//! VELD_HTTP_PORT=9000 ANTHROPIC_API_KEY=sk-... cargo run --bin veld-explore-server
//!
//! # Verbose logging
//! cargo run --bin veld-explore-server -- -v
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use veld_explore_server::cache::SystemClock;
use veld_explore_server::config::ServerConfig;
use veld_explore_server::errors::{AppError, AppResult};
use veld_explore_server::limits::FixedWindowLimiter;
use veld_explore_server::resources::ServerResources;
use veld_explore_server::routes::router;
use veld_explore_server::store::memory::InMemoryStore;

#[derive(Parser)]
#[command(
    name = "veld-explore-server",
    about = "Veld Explore assistant server",
    long_about = "HTTP server for the Veld Explore travel assistant"
)]
struct ServerArgs {
    /// Port override; takes precedence over VELD_HTTP_PORT
    #[arg(long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let args = ServerArgs::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(default_level)
        }))
        .init();

    let mut config = ServerConfig::from_env()?;
    if let Some(port) = args.port {
        config.http_port = port;
    }

    if config.llm_api_key.is_none() {
        info!("no LLM credential configured; assistant replies will be degraded");
    }

    let clock = Arc::new(SystemClock);
    let store = Arc::new(InMemoryStore::seeded());
    let limiter = Arc::new(FixedWindowLimiter::new(clock.clone()));
    let resources = Arc::new(ServerResources::new(config.clone(), store, limiter, clock));

    let app = router(resources).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::config(format!("failed to bind {addr}: {err}")))?;

    info!(%addr, "veld-explore-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::internal(format!("server error: {err}")))?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    // Serve until interrupted; signal handler failure just disables
    // graceful shutdown
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
