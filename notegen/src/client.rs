//! Inference API client
//!
//! The endpoint takes `POST {"prompt": "..."}` and answers with an envelope
//! `{"ok": true, "output": "..."}`. Anything else is an error; nothing is
//! retried.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Per-call timeout for inference requests
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Longest slice of an error body kept in error messages
const ERROR_BODY_LIMIT: usize = 500;

/// Inference client errors
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Status(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("API reported failure: {0}")]
    Envelope(String),
}

/// Anything that can turn a prompt into model output text
///
/// The HTTP client is the production implementation; tests drive the
/// pipeline with scripted fakes.
pub trait InferenceApi {
    fn infer(&self, prompt: &str) -> impl Future<Output = Result<String, InferenceError>> + Send;
}

#[derive(Debug, Serialize)]
struct InferRequest<'a> {
    prompt: &'a str,
}

/// Response wrapper returned by the inference endpoint
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub ok: Option<bool>,
    #[serde(default)]
    pub output: Value,
    #[serde(default)]
    pub error: Option<String>,
}

impl Envelope {
    /// Unwrap the envelope into output text
    ///
    /// `ok` must be present and true. String output is returned verbatim,
    /// null as the empty string, any other JSON value re-serialized.
    pub fn into_output(self) -> Result<String, InferenceError> {
        match self.ok {
            Some(true) => {}
            Some(false) => {
                return Err(InferenceError::Envelope(
                    self.error.unwrap_or_else(|| "ok=false".to_string()),
                ))
            }
            None => {
                return Err(InferenceError::Envelope(
                    "response has no \"ok\" field".to_string(),
                ))
            }
        }

        Ok(match self.output {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }
}

/// Parse a raw response body into output text
pub fn parse_envelope(body: &str) -> Result<String, InferenceError> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| InferenceError::Parse(format!("{} (body: {})", e, truncate(body))))?;
    envelope.into_output()
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// HTTP client for one inference endpoint
#[derive(Debug, Clone)]
pub struct HttpInferenceClient {
    http_client: reqwest::Client,
    api_url: String,
}

impl HttpInferenceClient {
    pub fn new(api_url: impl Into<String>) -> Result<Self, InferenceError> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| InferenceError::Network(e.to_string()))?;
        Ok(Self::with_client(http_client, api_url))
    }

    /// Reuse an existing connection pool (the web server shares one)
    pub fn with_client(http_client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            http_client,
            api_url: api_url.into(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

impl InferenceApi for HttpInferenceClient {
    async fn infer(&self, prompt: &str) -> Result<String, InferenceError> {
        tracing::debug!(
            api_url = %self.api_url,
            prompt_chars = prompt.chars().count(),
            "Calling inference API"
        );

        let response = self
            .http_client
            .post(&self.api_url)
            .json(&InferRequest { prompt })
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| InferenceError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| InferenceError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(InferenceError::Status(
                status.as_u16(),
                truncate(&body).to_string(),
            ));
        }

        let output = parse_envelope(&body)?;
        tracing::debug!(output_chars = output.chars().count(), "Inference call succeeded");
        Ok(output)
    }
}
