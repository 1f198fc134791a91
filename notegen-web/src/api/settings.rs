//! Settings endpoint
//!
//! GET /api/settings returns the settings a submission with blank fields
//! would use, so the page can pre-fill its form.

use axum::{extract::State, routing::get, Json, Router};
use notegen_common::{Settings, SettingsOverrides};

use crate::{ApiResult, AppState};

/// GET /api/settings
///
/// **Response:** `{"api_url", "notes_dir", "delay_meta_content", "delay_between_rows"}`
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<Settings>> {
    let settings = state.resolve_settings(SettingsOverrides::default())?;
    Ok(Json(settings))
}

/// Build settings routes
pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/api/settings", get(get_settings))
}
