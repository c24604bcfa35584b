//! accent-id library interface
//!
//! Exposes the router and application state for the binary and for
//! integration testing with stub classifiers.

pub mod api;
pub mod audio;
pub mod classifier;
pub mod error;
pub mod staging;

pub use crate::error::{ApiError, ApiResult};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use accent_common::config::UploadConfig;
use axum::Router;
use chrono::{DateTime, Utc};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::classifier::AccentClassifier;

/// Upload handling settings resolved from configuration
#[derive(Debug, Clone)]
pub struct UploadSettings {
    /// Request body limit for the classify endpoint
    pub max_bytes: usize,
    /// Directory for staged uploads (system temp dir if `None`)
    pub temp_dir: Option<PathBuf>,
    /// Upper bound on one classification
    pub classify_timeout: Option<Duration>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self::from(&UploadConfig::default())
    }
}

impl From<&UploadConfig> for UploadSettings {
    fn from(config: &UploadConfig) -> Self {
        Self {
            max_bytes: config.max_bytes,
            temp_dir: config.temp_dir.clone(),
            classify_timeout: config.classify_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Classifier loaded at startup, read-only afterwards
    pub classifier: Arc<dyn AccentClassifier>,
    /// Identifier of the loaded model
    pub model_name: String,
    /// Upload staging settings
    pub upload: UploadSettings,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        classifier: Arc<dyn AccentClassifier>,
        model_name: impl Into<String>,
        upload: UploadSettings,
    ) -> Self {
        Self {
            classifier,
            model_name: model_name.into(),
            upload,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// CORS admits every origin, method and header with credentials; the
/// request origin is mirrored since a wildcard cannot carry credentials.
pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.upload.max_bytes;

    Router::new()
        .merge(api::classify_routes(max_upload_bytes))
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
}
