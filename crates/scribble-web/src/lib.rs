//! scribble-web - Judge endpoint and prompt list server for scribble using Axum

pub mod api;
pub mod judge;
pub mod router;

pub use api::{ApiError, ApiState, PromptsAsset};
pub use judge::{OpenAiJudge, UpstreamError, UpstreamJudge};
pub use router::create_router;

use anyhow::Result;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Port used by the CLI when none is given
pub const DEFAULT_PORT: u16 = 3333;

/// Server-side settings, resolved from the environment and CLI
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub prompts_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_key: None,
            model: judge::DEFAULT_MODEL.to_string(),
            base_url: judge::DEFAULT_BASE_URL.to_string(),
            prompts_path: None,
        }
    }
}

impl ServerConfig {
    /// Defaults with the credential taken from `OPENAI_API_KEY`
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var(judge::OPENAI_API_KEY_ENV).ok(),
            ..Self::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_prompts_path(mut self, path: Option<PathBuf>) -> Self {
        self.prompts_path = path;
        self
    }

    /// Build handler state with the OpenAI judge
    pub fn into_state(self) -> Result<Arc<ApiState<OpenAiJudge>>> {
        let judge = OpenAiJudge::new(self.api_key, self.model, self.base_url)?;
        let prompts = match self.prompts_path {
            Some(path) => PromptsAsset::File(path),
            None => PromptsAsset::Embedded,
        };
        Ok(Arc::new(ApiState::new(judge, prompts)))
    }
}

/// Build the OpenAI-backed state from `config` and serve it on `config.port`
pub async fn serve(config: ServerConfig) -> Result<()> {
    let port = config.port;
    run(config.into_state()?, port).await
}

/// Run the web server
pub async fn run<J>(state: Arc<ApiState<J>>, port: u16) -> Result<()>
where
    J: UpstreamJudge + 'static,
{
    if let Some(name) = state.judge.missing_credential() {
        warn!(credential = name, "Judge credential not set, /api/ai will answer 500");
    }

    let router = create_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr).await?;

    info!("Judge server listening on http://{}", addr);
    println!("Judge server listening on http://{}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_builders() {
        let config = ServerConfig::default()
            .with_port(4040)
            .with_prompts_path(Some(PathBuf::from("prompts.txt")));

        assert_eq!(config.port, 4040);
        assert_eq!(config.model, judge::DEFAULT_MODEL);

        let state = config.into_state().unwrap();
        assert!(matches!(state.prompts, PromptsAsset::File(_)));
        assert_eq!(
            state.judge.missing_credential(),
            Some(judge::OPENAI_API_KEY_ENV)
        );
    }
}
