//! Concierge - assistant chat widget backend
//!
//! Runs one conversation session per page visitor against a hosted
//! assistant's thread/run API and streams the rendered replies to the page.

mod api;
mod assistants;
mod config;
mod error;
mod render;
mod runtime;
mod state_machine;
mod tools;
mod widget;

use api::{create_router, AppState};
use assistants::{LoggingApi, OpenAIAssistants};
use config::{WidgetConfig, EXPIRY_SWEEP_PERIOD};
use std::net::SocketAddr;
use std::sync::Arc;
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
                .unwrap_or_else(|_| "concierge=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = WidgetConfig::from_env();
    config.warn_if_incomplete();

    let api = LoggingApi::new(OpenAIAssistants::new(
        config.api_key.clone().unwrap_or_default(),
        config.api_base.as_deref(),
    ));
    let tools = config.tools();
    tracing::info!(
        api_base = config.api_base.as_deref().unwrap_or(assistants::DEFAULT_API_BASE),
        poll_interval_ms = %config.poll.poll_interval.as_millis(),
        settle_delay_ms = %config.poll.settle_delay.as_millis(),
        max_polls = config.poll.max_polls,
        session_idle_secs = config.session_idle.as_secs(),
        tools = ?tools.names(),
        "Assistants client initialized"
    );

    // Create application state
    let state = AppState::new(Arc::new(api), config.session_settings());
    state
        .sessions
        .spawn_expiry(config.session_idle, EXPIRY_SWEEP_PERIOD);

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
    tracing::info!("Concierge server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
