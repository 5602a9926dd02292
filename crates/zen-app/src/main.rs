//! Zen application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Apply flag and environment overrides
//! 3. Build the chat workflow (template engine, optional upstream model)
//! 4. Start the axum HTTP server

mod cli;

use clap::Parser;

use zen_api::routes;
use zen_api::state::AppState;
use zen_core::config::ZenConfig;

use crate::cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let mut config = ZenConfig::load_or_default(&config_file);
    args.apply(&mut config);

    // Tracing. RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Zen v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");
    tracing::info!(
        mock_mode = config.upstream.use_mock(),
        model = %config.upstream.model,
        "Upstream configuration resolved"
    );

    let state = AppState::new(config.clone());

    if let Err(e) = routes::start_server(&config, state).await {
        tracing::error!(error = %e, "Server stopped");
        tracing::error!("Try: ZEN_PORT={} zen", config.server.port.saturating_add(1));
        return Err(e.into());
    }

    Ok(())
}
