//! HTTP handlers for the judge endpoint

use crate::judge::{UpstreamError, UpstreamJudge};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use scribble_core::gateway::{JudgeFailure, JudgeReply, JudgeRequest};
use scribble_core::parse_score;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Prompt list bundled with the server
pub const DEFAULT_PROMPTS: &str = include_str!("../static/prompts.txt");

/// Where `/prompts.txt` comes from
#[derive(Debug, Clone)]
pub enum PromptsAsset {
    /// Serve a file from disk (read on every request)
    File(PathBuf),
    /// Serve the bundled list
    Embedded,
}

/// Shared state for all handlers
pub struct ApiState<J> {
    pub judge: J,
    pub prompts: PromptsAsset,
}

impl<J> ApiState<J> {
    pub fn new(judge: J, prompts: PromptsAsset) -> Self {
        Self { judge, prompts }
    }
}

/// Error surfaced by `/api/ai` as `{ error, detail? }`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing {name} on server")]
    MissingCredential { name: &'static str },

    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    Upstream {
        status: u16,
        message: String,
        detail: Option<String>,
    },
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingCredential { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|code| code.is_client_error() || code.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(e: UpstreamError) -> Self {
        ApiError::Upstream {
            status: e.status,
            message: e.message,
            detail: e.detail,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = match &self {
            ApiError::Upstream {
                message, detail, ..
            } => Some(detail.clone().unwrap_or_else(|| message.clone())),
            _ => None,
        };
        error!(status = status.as_u16(), error = %self, "API /api/ai error");

        let body = JudgeFailure {
            error: self.to_string(),
            detail,
        };
        (status, Json(body)).into_response()
    }
}

/// `POST /api/ai` - score a drawing against its prompt
pub async fn judge_handler<J: UpstreamJudge>(
    State(state): State<Arc<ApiState<J>>>,
    body: Bytes,
) -> Result<Json<JudgeReply>, ApiError> {
    if let Some(name) = state.judge.missing_credential() {
        return Err(ApiError::MissingCredential { name });
    }

    let request: JudgeRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Validation(format!("Invalid JSON body: {}", e)))?;

    if request.text.is_empty() || request.image_url.is_empty() {
        return Err(ApiError::Validation(
            r#"Both "text" (prompt string) and "imageUrl" are required."#.to_string(),
        ));
    }

    let raw = state
        .judge
        .judge(&request.text, &request.image_url)
        .await?
        .trim()
        .to_string();
    let output = parse_score(&raw);

    info!(prompt = %request.text, output, raw = %raw, "Judged drawing");
    Ok(Json(JudgeReply { output, raw }))
}

/// `GET /prompts.txt` when no prompt file is configured
pub async fn embedded_prompts_handler() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        DEFAULT_PROMPTS,
    )
}

/// `GET /api/health`
pub async fn health_handler<J: UpstreamJudge>(
    State(state): State<Arc<ApiState<J>>>,
) -> Json<serde_json::Value> {
    let missing = state.judge.missing_credential();
    Json(serde_json::json!({
        "status": if missing.is_none() { "healthy" } else { "misconfigured" },
        "model": state.judge.model(),
        "missing_credential": missing,
    }))
}
