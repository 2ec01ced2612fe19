//! georisk-ra - Risk Assessor service
//!
//! **Module Identity:**
//! - Name: georisk-ra (Risk Assessor)
//! - Port: 5001
//!
//! Accepts a property address, resolves it to coordinates, gathers
//! satellite-derived environmental indicators, and returns an AI-generated
//! multi-hazard risk report for underwriting.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use georisk_ra::config::ServiceConfig;
use georisk_ra::AppState;

const DEFAULT_LOG_FILTER: &str = "georisk_ra=debug,info";

#[derive(Debug, Parser)]
#[command(name = "georisk-ra", version, about = "GeoRisk Risk Assessor service")]
struct Args {
    /// Path to the TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the listener port
    #[arg(long)]
    port: Option<u16>,

    /// Override the bind address
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config must load before logging so the configured filter can apply
    let config_path = georisk_common::config::resolve_config_path(
        args.config.as_deref(),
        "GEORISK_CONFIG",
        "georisk-ra.toml",
    );
    let toml_config = georisk_common::config::load_toml_config(&config_path)?;

    // Filter priority: RUST_LOG > config > compiled default
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(
            toml_config
                .logging
                .level
                .clone()
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        )
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting georisk-ra (Risk Assessor) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Config: {}", config_path.display());

    let config = ServiceConfig::resolve(&toml_config, args.bind, args.port)?;
    info!("Gemini model: {}", config.gemini_model);
    info!("Geocoder: {}", config.geocoder_base_url);
    match &config.earthdata_base_url {
        Some(url) => info!("Environmental-data service: {}", url),
        None => info!("Environmental-data service: not configured"),
    }

    let bind_address = format!("{}:{}", config.bind_address, config.port);

    // Create application state (builds the upstream HTTP clients)
    let state = AppState::new(config)?;

    // Build router
    let app = georisk_ra::build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
