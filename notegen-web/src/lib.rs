//! notegen-web library - local web front end for the note generator
//!
//! One page, two synchronous endpoints: generate one note from a subject, or
//! a batch from an uploaded CSV. Requests block until the whole flow
//! (including the configured pauses) is done.

use axum::Router;
use chrono::{DateTime, Utc};
use notegen::HttpInferenceClient;
use notegen_common::{Settings, SettingsOverrides, SettingsStore};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub mod api;
pub mod error;

pub use crate::error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Connection pool reused for every inference call
    pub http_client: reqwest::Client,
    /// Saved settings file, read on every request and rewritten on submit
    pub settings_store: SettingsStore,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(http_client: reqwest::Client, settings_store: SettingsStore) -> Self {
        Self {
            http_client,
            settings_store,
            startup_time: Utc::now(),
        }
    }

    /// Resolve settings for one request: form → environment → saved file → defaults
    pub fn resolve_settings(&self, overrides: SettingsOverrides) -> ApiResult<Settings> {
        Ok(self.settings_store.resolve(overrides)?)
    }

    /// Remember the settings of a submission for the next page load (best effort)
    pub fn remember_settings(&self, settings: &Settings) {
        if let Err(e) = self.settings_store.save(settings) {
            warn!(
                "Could not save settings to {}: {}",
                self.settings_store.path().display(),
                e
            );
        }
    }

    pub fn inference_client(&self, settings: &Settings) -> HttpInferenceClient {
        HttpInferenceClient::with_client(self.http_client.clone(), settings.api_url.clone())
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .merge(api::note_routes())
        .merge(api::settings_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
