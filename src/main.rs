//! agent-chat: conversational client for a remote question-answering agent
//!
//! Keeps one durable transcript, forwards questions to the agent service one
//! at a time, and serves the session over HTTP with live SSE updates.

mod api;
mod config;
mod db;
mod notify;
mod query;
mod runtime;
mod state_machine;
mod transcript;

use api::{create_router, AppState};
use config::Config;
use db::Database;
use notify::ChannelSink;
use query::{HttpQueryClient, LoggingClient};
use runtime::DatabaseStore;
use state_machine::SessionContext;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agent_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env();

    // Initialize database
    let db = if config.in_memory_db() {
        tracing::info!("Using in-memory database; the transcript will not survive restarts");
        Database::open_in_memory()?
    } else {
        if let Some(parent) = PathBuf::from(&config.db_path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        tracing::info!(path = %config.db_path, "Opening database");
        Database::open(&config.db_path)?
    };

    // Remote agent client
    let http = Arc::new(HttpQueryClient::new(&config.api_url, config.request_timeout)?);
    tracing::info!(
        api_url = %config.api_url,
        timeout_secs = config.request_timeout.as_secs(),
        "Query client initialized"
    );

    let notifications = ChannelSink::new(64);
    let shutdown = CancellationToken::new();

    let context = SessionContext::new(&config.session_id)
        .with_notification_duration(config.notification_duration);
    let session = runtime::start_session(
        context,
        DatabaseStore::new(db, &config.session_id),
        LoggingClient::new(http.clone()),
        notifications.clone(),
        shutdown.clone(),
    )
    .await;

    // Create application state
    let state = AppState::new(session, http, notifications);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("agent-chat server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    Ok(())
}

/// Resolve on Ctrl-C, stopping the session runtime first
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
    shutdown.cancel();
}
