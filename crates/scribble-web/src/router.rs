//! Web router using Axum

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeFile;

use crate::api::{self, ApiState, PromptsAsset};
use crate::judge::UpstreamJudge;

/// Canvas snapshots travel as base64 data URLs and outgrow axum's 2 MB default
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Create the web router
pub fn create_router<J>(state: Arc<ApiState<J>>) -> Router
where
    J: UpstreamJudge + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .route("/api/ai", post(api::judge_handler::<J>))
        .route("/api/health", get(api::health_handler::<J>));

    let router = match &state.prompts {
        PromptsAsset::File(path) => router.route_service("/prompts.txt", ServeFile::new(path)),
        PromptsAsset::Embedded => router.route("/prompts.txt", get(api::embedded_prompts_handler)),
    };

    router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}
