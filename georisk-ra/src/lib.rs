//! georisk-ra library interface
//!
//! Exposes the application state and router for the binary and for
//! integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServiceConfig;
use crate::services::earthdata::EarthDataClient;
use crate::services::gemini::GeminiClient;
use crate::services::geocoder::GeocoderClient;
use crate::services::ReportService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Resolved configuration snapshot
    pub config: Arc<ServiceConfig>,
    /// Report orchestration service
    pub reports: Arc<ReportService>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    /// Build the state and its upstream clients from configuration
    pub fn new(config: ServiceConfig) -> anyhow::Result<Self> {
        let geocoder = Arc::new(GeocoderClient::new(config.geocoder_base_url.clone())?);

        let earthdata = match &config.earthdata_base_url {
            Some(base_url) => Some(Arc::new(EarthDataClient::new(
                base_url.clone(),
                config.earthdata_api_key.clone(),
            )?)),
            None => {
                tracing::warn!(
                    "No environmental-data service configured; wildfire scores and the \
                     location card will rely on the AI model alone"
                );
                None
            }
        };

        let gemini = Arc::new(GeminiClient::new(
            config.gemini_base_url.clone(),
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
        )?);

        let reports = Arc::new(ReportService::new(geocoder, earthdata, gemini));

        Ok(Self {
            config: Arc::new(config),
            reports,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        })
    }

    /// Record a request failure for the health endpoint diagnostics
    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // UI routes (HTML pages)
        .merge(api::ui_routes())
        // API routes
        .merge(api::report_routes())
        .merge(api::health_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
