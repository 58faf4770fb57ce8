use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quill_gateway::registry;
use quill_gateway::server;
use quill_gateway::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (reads .env, env vars and the TOML settings file)
    let config = quill_core::Config::load()?;

    // Initialize tracing; RUST_LOG wins over the configured level
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.settings.logging.level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build all provider adapters once; the key set is fixed from here on
    let registry = registry::build_from_config(&config)?;
    info!("Registered providers: {}", registry.keys().join(", "));

    let state = Arc::new(AppState::new(
        registry,
        config.secrets.gateway_api_key.clone(),
        config.settings.gateway.allowed_ips.clone(),
    ));

    if config.settings.gateway.host != "127.0.0.1" && config.settings.gateway.host != "localhost" {
        tracing::warn!(
            "Gateway binding to non-localhost address: {}. This may expose the API to remote access.",
            config.settings.gateway.host
        );
    }

    let bind_addr = config.bind_addr();
    info!("Starting quill gateway on {}", bind_addr);

    server::run(state, &bind_addr).await
}
