//! Integration tests for notegen-web endpoints
//!
//! Requests go through the router with `oneshot`; the inference API is an
//! axum mock on an ephemeral port, passed in through the `api_url` field.
//! Notes and the settings file live in a temp directory per test. The one
//! test that clears API_URL is marked #[serial].

use std::path::Path;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    routing::post,
    Json, Router,
};
use notegen_common::config::ENV_API_URL;
use notegen_common::SettingsStore;
use notegen_web::{build_router, AppState};
use serde_json::{json, Value};
use serial_test::serial;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

const BOUNDARY: &str = "notegen-test-boundary";

/// Mock model: metadata prompts get JSON, body prompts get prose.
/// Subjects starting with "Fail" get an ok=false envelope.
async fn mock_model(Json(request): Json<Value>) -> Json<Value> {
    let prompt = request["prompt"].as_str().unwrap_or_default();
    if prompt.contains("Subject: Fail") {
        return Json(json!({ "ok": false, "output": "", "error": "model refused" }));
    }
    if prompt.starts_with("You will ONLY return strict JSON") {
        Json(json!({
            "ok": true,
            "output": r#"{"title": "Mock Title", "topic": "mock", "topics": ["Biology"], "tags": ["test"]}"#,
        }))
    } else {
        Json(json!({ "ok": true, "output": "Mock body." }))
    }
}

async fn spawn_mock_model() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = Router::new().route("/infer", post(mock_model));
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/infer", addr)
}

/// Test helper: app whose settings file lives in `dir`
fn setup_app(dir: &TempDir) -> Router {
    let store = SettingsStore::new(dir.path().join("config.toml"));
    build_router(AppState::new(reqwest::Client::new(), store))
}

fn percent_encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{:02X}", b),
        })
        .collect()
}

fn form_request(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let body = fields
        .iter()
        .map(|(name, value)| format!("{}={}", name, percent_encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn multipart_request(fields: &[(&str, &str)], file: Option<&str>) -> Request<Body> {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    if let Some(content) = file {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"subjects.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n{content}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

fn notes_dir(dir: &TempDir) -> String {
    dir.path().join("notes").display().to_string()
}

fn read_note(dir: &TempDir, file: &str) -> String {
    std::fs::read_to_string(dir.path().join("notes").join(file)).unwrap()
}

fn assert_no_notes(dir: &Path) {
    let notes = dir.join("notes");
    assert!(!notes.exists() || std::fs::read_dir(notes).unwrap().next().is_none());
}

// =============================================================================
// Static pages and health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let response = setup_app(&dir).oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "obsidian-note-gen-web");
    assert!(body["version"].is_string());
    assert!(body["uptime_seconds"].is_number());
    assert!(body["settings_file"].as_str().unwrap().ends_with("config.toml"));
    assert_eq!(body["settings_saved"], false);
}

#[tokio::test]
async fn test_index_serves_html() {
    let dir = tempfile::tempdir().unwrap();
    let response = setup_app(&dir).oneshot(get_request("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.contains("text/html"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("id=\"drop-zone\""));
    assert!(html.contains("/static/app.js"));
}

#[tokio::test]
async fn test_app_js_served() {
    let dir = tempfile::tempdir().unwrap();
    let response = setup_app(&dir).oneshot(get_request("/static/app.js")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/javascript");
}

#[tokio::test]
#[serial]
async fn test_settings_endpoint_reports_saved_settings() {
    std::env::remove_var(ENV_API_URL);
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "api_url = \"http://saved.example/infer\"\n",
    )
    .unwrap();

    let response = setup_app(&dir).oneshot(get_request("/api/settings")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert!(body["api_url"].is_string());
    assert!(body["notes_dir"].is_string());
    assert!(body["delay_meta_content"].is_number());
    assert!(body["delay_between_rows"].is_number());
    assert_eq!(body["api_url"], "http://saved.example/infer");
}

// =============================================================================
// POST /run-one
// =============================================================================

#[tokio::test]
async fn test_run_one_writes_note_and_saves_settings() {
    let api_url = spawn_mock_model().await;
    let dir = tempfile::tempdir().unwrap();
    let notes = notes_dir(&dir);

    let request = form_request(
        "/run-one",
        &[
            ("api_url", &api_url),
            ("notes_dir", &notes),
            ("delay_meta", "0"),
            ("delay_rows", "0"),
            ("subject", "Tide Pools"),
        ],
    );
    let response = setup_app(&dir).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let expected_path = dir.path().join("notes").join("tide-pools.md");
    assert_eq!(body["path"], expected_path.display().to_string());

    let note = read_note(&dir, "tide-pools.md");
    assert!(note.starts_with("---\ntitle: \"Mock Title\"\n"));
    assert!(note.contains("topics: [\"Biology\"]\n"));
    assert!(note.contains("tags: [biology, test]\n"));
    assert!(note.ends_with("---\n\nMock body.\n"));

    let saved = SettingsStore::new(dir.path().join("config.toml"))
        .load()
        .unwrap()
        .expect("settings should be saved");
    assert_eq!(saved.api_url.as_deref(), Some(api_url.as_str()));
    assert_eq!(saved.delay_meta_content, Some(0));
}

#[tokio::test]
async fn test_run_one_accepts_long_delay_names() {
    let api_url = spawn_mock_model().await;
    let dir = tempfile::tempdir().unwrap();
    let notes = notes_dir(&dir);

    let request = form_request(
        "/run-one",
        &[
            ("api_url", &api_url),
            ("notes_dir", &notes),
            ("delay_meta_content", "0"),
            ("delay_between_rows", "0"),
            ("subject", "Kelp"),
        ],
    );
    let response = setup_app(&dir).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(dir.path().join("notes").join("kelp.md").exists());
}

#[tokio::test]
async fn test_run_one_both_delay_names_last_wins() {
    let api_url = spawn_mock_model().await;
    let dir = tempfile::tempdir().unwrap();
    let notes = notes_dir(&dir);

    let request = form_request(
        "/run-one",
        &[
            ("api_url", &api_url),
            ("notes_dir", &notes),
            ("delay_meta", "soon"),
            ("delay_meta_content", "0"),
            ("delay_rows", "0"),
            ("subject", "Kelp"),
        ],
    );
    let response = setup_app(&dir).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(dir.path().join("notes").join("kelp.md").exists());
}

#[tokio::test]
async fn test_run_one_both_delay_names_without_subject_is_json_error() {
    let dir = tempfile::tempdir().unwrap();

    let request = form_request(
        "/run-one",
        &[("delay_meta", "1"), ("delay_meta_content", "2"), ("subject", "")],
    );
    let response = setup_app(&dir).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["error"]["message"].as_str().unwrap().contains("subject"));
}

#[tokio::test]
async fn test_run_one_wrong_content_type_is_json_error() {
    let dir = tempfile::tempdir().unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/run-one")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("subject=Kelp"))
        .unwrap();
    let response = setup_app(&dir).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_run_one_requires_subject() {
    let dir = tempfile::tempdir().unwrap();
    let notes = notes_dir(&dir);

    let request = form_request("/run-one", &[("notes_dir", &notes), ("subject", "  ")]);
    let response = setup_app(&dir).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_no_notes(dir.path());
}

#[tokio::test]
async fn test_run_one_rejects_non_numeric_delay() {
    let dir = tempfile::tempdir().unwrap();

    let request = form_request("/run-one", &[("delay_meta", "soon"), ("subject", "Kelp")]);
    let response = setup_app(&dir).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"]["message"].as_str().unwrap().contains("delay_meta"));
}

#[tokio::test]
async fn test_run_one_reports_inference_failure() {
    let api_url = spawn_mock_model().await;
    let dir = tempfile::tempdir().unwrap();
    let notes = notes_dir(&dir);

    let request = form_request(
        "/run-one",
        &[
            ("api_url", &api_url),
            ("notes_dir", &notes),
            ("delay_meta", "0"),
            ("subject", "Fail fast"),
        ],
    );
    let response = setup_app(&dir).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "INFERENCE_ERROR");
    assert!(body["error"]["message"].as_str().unwrap().contains("model refused"));
    assert_no_notes(dir.path());
}

// =============================================================================
// POST /upload
// =============================================================================

#[tokio::test]
async fn test_upload_writes_one_note_per_row() {
    let api_url = spawn_mock_model().await;
    let dir = tempfile::tempdir().unwrap();
    let notes = notes_dir(&dir);

    let request = multipart_request(
        &[
            ("api_url", &api_url),
            ("notes_dir", &notes),
            ("delay_meta", "0"),
            ("delay_rows", "0"),
        ],
        Some("subject,comment\nTide Pools,first\n# skipped\nKelp Forests,second\n"),
    );
    let response = setup_app(&dir).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let paths: Vec<&str> = body["paths"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_str().unwrap())
        .collect();
    assert_eq!(paths.len(), 2);
    assert!(paths[0].ends_with("tide-pools.md"));
    assert!(paths[1].ends_with("kelp-forests.md"));
    assert_eq!(body["failures"], json!([]));

    assert!(read_note(&dir, "kelp-forests.md").ends_with("Mock body.\n"));
}

#[tokio::test]
async fn test_upload_continues_after_failed_row() {
    let api_url = spawn_mock_model().await;
    let dir = tempfile::tempdir().unwrap();
    let notes = notes_dir(&dir);

    let request = multipart_request(
        &[
            ("api_url", &api_url),
            ("notes_dir", &notes),
            ("delay_meta", "0"),
            ("delay_rows", "0"),
        ],
        Some("Fail this one\nKelp Forests\n"),
    );
    let response = setup_app(&dir).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["paths"].as_array().unwrap().len(), 1);
    let failures = body["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["line"], 1);
    assert_eq!(failures[0]["subject"], "Fail this one");
    assert!(dir.path().join("notes").join("kelp-forests.md").exists());
}

#[tokio::test]
async fn test_upload_without_file_returns_empty() {
    let dir = tempfile::tempdir().unwrap();
    let notes = notes_dir(&dir);

    let request = multipart_request(&[("notes_dir", &notes)], None);
    let response = setup_app(&dir).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["paths"], json!([]));
    assert_eq!(body["failures"], json!([]));
}
