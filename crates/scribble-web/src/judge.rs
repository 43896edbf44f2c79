//! Upstream multimodal model used as the judge
//!
//! The server owns the credential; clients only ever see `{ output, raw }`.

use anyhow::Context;
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the upstream credential
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const SYSTEM_INSTRUCTION: &str = "You are a strict image scorer. Score the drawing from 1 to 100 \
based on closeness to the prompt. Output ONLY the integer, no words.";

const MAX_OUTPUT_TOKENS: u32 = 32;

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);

/// Upstream failure with the status it should surface as
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct UpstreamError {
    pub status: u16,
    pub message: String,
    pub detail: Option<String>,
}

/// A model that can rate a drawing against a prompt
pub trait UpstreamJudge: Send + Sync {
    /// Name of the credential that is missing, if any
    fn missing_credential(&self) -> Option<&'static str>;

    /// Model identifier, for health output and logs
    fn model(&self) -> &str;

    /// Raw text answer for `prompt` + `image_url`
    fn judge(
        &self,
        prompt: &str,
        image_url: &str,
    ) -> impl Future<Output = Result<String, UpstreamError>> + Send;
}

/// OpenAI Responses API judge
#[derive(Debug, Clone)]
pub struct OpenAiJudge {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenAiJudge {
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .context("Failed to build upstream HTTP client")?;
        Ok(Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn request_body(&self, prompt: &str, image_url: &str) -> Value {
        json!({
            "model": self.model,
            "input": [
                {
                    "role": "system",
                    "content": [{ "type": "input_text", "text": SYSTEM_INSTRUCTION }]
                },
                {
                    "role": "user",
                    "content": [
                        { "type": "input_text", "text": prompt },
                        { "type": "input_image", "image_url": image_url, "detail": "high" }
                    ]
                }
            ],
            "max_output_tokens": MAX_OUTPUT_TOKENS
        })
    }
}

impl UpstreamJudge for OpenAiJudge {
    fn missing_credential(&self) -> Option<&'static str> {
        self.api_key.is_none().then_some(OPENAI_API_KEY_ENV)
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn judge(&self, prompt: &str, image_url: &str) -> Result<String, UpstreamError> {
        let Some(api_key) = &self.api_key else {
            return Err(UpstreamError {
                status: 500,
                message: format!("Missing {} on server", OPENAI_API_KEY_ENV),
                detail: None,
            });
        };

        let response = self
            .http
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(api_key)
            .json(&self.request_body(prompt, image_url))
            .send()
            .await
            .map_err(|e| UpstreamError {
                status: e.status().map(|s| s.as_u16()).unwrap_or(500),
                message: e.to_string(),
                detail: None,
            })?;

        let status = response.status();
        let body: Value = response.json().await.map_err(|e| UpstreamError {
            status: if status.is_success() { 502 } else { status.as_u16() },
            message: format!("Unreadable upstream response: {}", e),
            detail: None,
        })?;

        if !status.is_success() {
            let detail = body["error"]["message"].as_str().map(str::to_string);
            return Err(UpstreamError {
                status: status.as_u16(),
                message: detail
                    .clone()
                    .unwrap_or_else(|| format!("Upstream returned HTTP {}", status.as_u16())),
                detail,
            });
        }

        Ok(extract_output_text(&body))
    }
}

/// Concatenate every `output_text` part of a Responses API body.
///
/// Falls back to a top-level `output_text` string when present.
pub fn extract_output_text(body: &Value) -> String {
    if let Some(text) = body["output_text"].as_str() {
        return text.trim().to_string();
    }

    let mut text = String::new();
    for item in body["output"].as_array().into_iter().flatten() {
        for part in item["content"].as_array().into_iter().flatten() {
            if part["type"] == "output_text" {
                if let Some(chunk) = part["text"].as_str() {
                    text.push_str(chunk);
                }
            }
        }
    }
    text.trim().to_string()
}
