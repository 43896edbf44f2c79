//! Prompt list loading and random selection
//!
//! Loading is soft-failing: a stale prompt is better than a broken session,
//! so an unreachable or empty resource is logged and the previous list kept.

use crate::error::CoreError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use reqwest::header::CACHE_CONTROL;
use std::path::Path;
use tracing::{info, warn};

/// Split newline-delimited text into trimmed, non-blank prompts
pub fn parse_prompts(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Source of drawing prompts
#[derive(Debug)]
pub struct PromptSource {
    prompts: Vec<String>,
    rng: StdRng,
}

impl Default for PromptSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptSource {
    pub fn new() -> Self {
        Self {
            prompts: Vec::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic selection, for tests and replays
    pub fn with_seed(seed: u64) -> Self {
        Self {
            prompts: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Start with an already-known list (blank entries are dropped)
    pub fn with_prompts<I, S>(mut self, prompts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed: Vec<String> = prompts
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if !parsed.is_empty() {
            self.prompts = parsed;
        }
        self
    }

    /// Load prompts from a URL or file path.
    ///
    /// Returns the number of prompts now loaded from this source, or 0 when
    /// the load failed and the previous list was kept.
    pub async fn load(&mut self, source: &str) -> usize {
        match fetch_source(source).await {
            Ok(text) => self.apply(source, &text),
            Err(e) => {
                warn!(source, error = %e, "Failed to load prompts, keeping previous list");
                0
            }
        }
    }

    /// Load prompts from text already in memory
    pub fn load_text(&mut self, source: &str, text: &str) -> usize {
        self.apply(source, text)
    }

    fn apply(&mut self, source: &str, text: &str) -> usize {
        let parsed = parse_prompts(text);
        if parsed.is_empty() {
            warn!(source, "Prompt list is empty, keeping previous list");
            return 0;
        }
        info!(source, count = parsed.len(), "Loaded prompts");
        self.prompts = parsed;
        self.prompts.len()
    }

    /// Pick a prompt uniformly at random from the last loaded list
    pub fn next(&mut self) -> Option<String> {
        self.prompts.choose(&mut self.rng).cloned()
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn is_loaded(&self) -> bool {
        !self.prompts.is_empty()
    }
}

async fn fetch_source(source: &str) -> Result<String, CoreError> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let response = reqwest::Client::new()
            .get(source)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|e| CoreError::PromptLoad {
                source_name: source.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::PromptLoad {
                source_name: source.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        response.text().await.map_err(|e| CoreError::PromptLoad {
            source_name: source.to_string(),
            message: e.to_string(),
        })
    } else {
        let path = Path::new(source);
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CoreError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })
    }
}
