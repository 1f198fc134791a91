//! Note generation endpoints
//!
//! Both handlers hold the request open for the whole run: the metadata call,
//! the pause, the body call and, for uploads, every row plus the pauses
//! between rows.

use axum::{
    extract::{rejection::FormRejection, Multipart, State},
    routing::post,
    Form, Json, Router,
};
use notegen::{process_subject, read_subjects, run_batch, RowFailure};
use serde::Serialize;
use tracing::info;

use super::form::RunForm;
use crate::{ApiError, ApiResult, AppState};

/// Response for POST /run-one
#[derive(Debug, Serialize)]
pub struct RunOneResponse {
    pub path: String,
}

/// Response for POST /upload
#[derive(Debug, Default, Serialize)]
pub struct UploadResponse {
    pub paths: Vec<String>,
    pub failures: Vec<RowFailure>,
}

/// POST /run-one
///
/// **Request:** urlencoded form with `subject` plus optional `api_url`,
/// `notes_dir`, `delay_meta`, `delay_rows`
/// **Response:** `{"path": "/home/me/Notes/ancient-bridges.md"}`
///
/// **Errors:**
/// - 400 Bad Request: missing subject, non-numeric delay or unreadable form body
/// - 502 Bad Gateway: inference call failed or returned ok=false
/// - 500 Internal Server Error: note could not be written
pub async fn run_one(
    State(state): State<AppState>,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> ApiResult<Json<RunOneResponse>> {
    let Form(pairs) = form.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let form = RunForm::from_pairs(pairs);

    let settings = state.resolve_settings(form.overrides()?)?;
    state.remember_settings(&settings);

    let subject = form
        .subject()
        .ok_or_else(|| ApiError::BadRequest("subject is required".to_string()))?;
    info!(subject, "Generating single note");

    let client = state.inference_client(&settings);
    let path = process_subject(&client, subject, &settings).await?;

    Ok(Json(RunOneResponse {
        path: path.display().to_string(),
    }))
}

/// POST /upload
///
/// **Request:** multipart form with a `file` part (CSV, first column is the
/// subject) plus the same optional settings fields as /run-one
/// **Response:** `{"paths": [...], "failures": [{"line", "subject", "error"}]}`
///
/// A failing row is reported in `failures`; later rows still run. Without a
/// `file` part nothing is generated.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut form = RunForm::default();
    let mut file: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
            file = Some(bytes.to_vec());
        } else {
            let value = field.text().await.map_err(|e| {
                ApiError::BadRequest(format!("Failed to read field {}: {}", name, e))
            })?;
            form.set_field(&name, value);
        }
    }

    let settings = state.resolve_settings(form.overrides()?)?;
    state.remember_settings(&settings);

    let Some(bytes) = file else {
        return Ok(Json(UploadResponse::default()));
    };

    let subjects = read_subjects(bytes.as_slice())?;
    info!("Upload contains {} subject(s)", subjects.len());

    let client = state.inference_client(&settings);
    let report = run_batch(&client, &subjects, &settings).await;

    Ok(Json(UploadResponse {
        paths: report
            .created
            .iter()
            .map(|path| path.display().to_string())
            .collect(),
        failures: report.failures,
    }))
}

/// Build note generation routes
pub fn note_routes() -> Router<AppState> {
    Router::new()
        .route("/run-one", post(run_one))
        .route("/upload", post(upload))
}
