//! Judge endpoint client
//!
//! Wire format: `POST { text, imageUrl }` answered by `200 { output, raw }`
//! or `{ error, detail? }` with the upstream status. The judge is not a
//! trusted structured API, so the reply is interpreted defensively.

use crate::error::CoreError;
use crate::scoring::{normalize_output, parse_score, MIN_SCORE};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Request body sent to the judge endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeRequest {
    /// Prompt the drawing answers
    #[serde(default)]
    pub text: String,
    /// PNG data URL of the surface
    #[serde(default)]
    pub image_url: String,
}

/// Success body returned by the judge endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeReply {
    pub output: u32,
    pub raw: String,
}

/// Failure body returned by the judge endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeFailure {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Interpreted judge answer for one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreResponse {
    /// Score in `[1, 100]`, or 0 when the judge gave no usable number
    pub output: u32,
    /// Raw judge text, for logging
    pub raw: String,
}

impl ScoreResponse {
    /// True when the output is a real score rather than the sentinel
    pub fn is_scored(&self) -> bool {
        self.output >= MIN_SCORE
    }
}

/// Gateway-level failure, always carrying an HTTP-style status
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("judge returned HTTP {status}: {message}")]
    Upstream {
        status: u16,
        message: String,
        detail: Option<String>,
    },

    #[error("judge unreachable: {message}")]
    Transport { message: String },

    #[error("judge sent an unreadable response: {message}")]
    MalformedResponse { message: String },
}

impl GatewayError {
    pub fn status(&self) -> u16 {
        match self {
            GatewayError::Upstream { status, .. } => *status,
            GatewayError::Transport { .. } => 503,
            GatewayError::MalformedResponse { .. } => 502,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            GatewayError::Upstream { message, .. }
            | GatewayError::Transport { message }
            | GatewayError::MalformedResponse { message } => message,
        }
    }

    /// Server-side misconfiguration (missing credential) rather than a judging failure
    pub fn is_misconfiguration(&self) -> bool {
        matches!(
            self,
            GatewayError::Upstream { status: 500, message, .. }
                if message.starts_with("Missing") && message.contains("on server")
        )
    }
}

/// Anything that can judge a drawing against a prompt
pub trait ScoringGateway {
    fn score(
        &self,
        prompt: &str,
        image_data_url: &str,
    ) -> impl Future<Output = Result<ScoreResponse, GatewayError>> + Send;
}

/// HTTP client for the judge endpoint
#[derive(Debug, Clone)]
pub struct JudgeClient {
    endpoint: String,
    http: reqwest::Client,
}

impl JudgeClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, CoreError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| CoreError::HttpClient { source })?;
        Ok(Self {
            endpoint: endpoint.into(),
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ScoringGateway for JudgeClient {
    async fn score(
        &self,
        prompt: &str,
        image_data_url: &str,
    ) -> Result<ScoreResponse, GatewayError> {
        let body = JudgeRequest {
            text: prompt.to_string(),
            image_url: image_data_url.to_string(),
        };

        tracing::debug!(endpoint = %self.endpoint, prompt, "Sending drawing to judge");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| GatewayError::Transport {
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(failure_from_body(status.as_u16(), &text));
        }

        interpret_reply(&text)
    }
}

/// Reply with a loosely typed `output`: number, numeric string, or missing
#[derive(Debug, Deserialize)]
struct LooseReply {
    #[serde(default)]
    output: serde_json::Value,
    #[serde(default)]
    raw: String,
}

/// Turn a 2xx body into a [`ScoreResponse`]
pub fn interpret_reply(body: &str) -> Result<ScoreResponse, GatewayError> {
    let reply: LooseReply =
        serde_json::from_str(body).map_err(|e| GatewayError::MalformedResponse {
            message: e.to_string(),
        })?;

    let reported = match &reply.output {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    let output = match reported {
        Some(value) => normalize_output(value),
        None => parse_score(&reply.raw),
    };

    Ok(ScoreResponse {
        output,
        raw: reply.raw,
    })
}

/// Turn a non-2xx body into a [`GatewayError`]
pub fn failure_from_body(status: u16, body: &str) -> GatewayError {
    match serde_json::from_str::<JudgeFailure>(body) {
        Ok(failure) => GatewayError::Upstream {
            status,
            message: failure.error,
            detail: failure.detail,
        },
        Err(_) => {
            let snippet: String = body.trim().chars().take(200).collect();
            GatewayError::Upstream {
                status,
                message: if snippet.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    snippet
                },
                detail: None,
            }
        }
    }
}
