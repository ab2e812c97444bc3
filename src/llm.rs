//! Model endpoint client.
//!
//! Speaks the Ollama `/api/generate` shape: POST `{model, prompt, stream: false}`,
//! read back the `response` string. Every failure is reported as "no answer";
//! the pipeline carries on without recommendations.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::AiConfig;

/// A text-generation endpoint.
pub trait Generate {
    /// Returns the model's text, or `None` if no usable answer came back.
    fn generate(&self, prompt: &str) -> Option<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    #[error("endpoint returned HTTP {0}")]
    Status(u16),

    #[error("response is not JSON: {0}")]
    InvalidJson(String),

    #[error("response JSON has no `response` string")]
    MissingResponse,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Blocking HTTP client for a configured model endpoint.
pub struct ModelClient {
    url: String,
    model: String,
    api_key: Option<String>,
    timeout_seconds: u64,
    client: reqwest::blocking::Client,
}

impl ModelClient {
    /// Build a client from configuration.
    ///
    /// Returns `Ok(None)` when no base URL is configured.
    pub fn from_config(config: &AiConfig) -> Result<Option<Self>, LlmError> {
        let Some(base_url) = config.base_url.as_deref().map(str::trim).filter(|u| !u.is_empty())
        else {
            return Ok(None);
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| LlmError::Http(format!("failed to create HTTP client: {e}")))?;

        Ok(Some(Self {
            url: format!("{}{}", base_url.trim_end_matches('/'), config.api_path),
            model: config.model_name.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            timeout_seconds: config.timeout_seconds,
            client,
        }))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn request(&self, prompt: &str) -> Result<String, LlmError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        debug!(url = %self.url, model = %self.model, "calling model endpoint");
        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.timeout_seconds)
            } else {
                LlmError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        let text = response.text().map_err(|e| LlmError::Http(e.to_string()))?;
        if !status.is_success() {
            debug!(body = %preview(&text), "non-success response body");
            return Err(LlmError::Status(status.as_u16()));
        }

        extract_response(&text)
    }
}

impl Generate for ModelClient {
    fn generate(&self, prompt: &str) -> Option<String> {
        self.request(prompt)
            .map_err(|e| warn!(url = %self.url, "model endpoint gave no answer: {e}"))
            .ok()
    }
}

/// Pull the `response` string out of an endpoint reply.
fn extract_response(body: &str) -> Result<String, LlmError> {
    let json: Value = serde_json::from_str(body).map_err(|e| LlmError::InvalidJson(e.to_string()))?;
    json.get("response")
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or(LlmError::MissingResponse)
}

fn preview(text: &str) -> String {
    text.chars().take(500).collect()
}
