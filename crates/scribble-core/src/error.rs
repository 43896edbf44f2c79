//! Error types for scribble-core
//!
//! Library-level failures use thiserror. Gateway and purchase errors live next
//! to the code that produces them (`gateway::GatewayError`,
//! `economy::PurchaseError`); this enum covers files, config and encoding.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for scribble operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // IO Errors
    // ===================
    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ===================
    // Resource Errors
    // ===================
    #[error("Failed to load prompts from {source_name}: {message}")]
    PromptLoad {
        source_name: String,
        message: String,
    },

    #[error("Failed to build HTTP client")]
    HttpClient {
        #[source]
        source: reqwest::Error,
    },

    // ===================
    // Surface Errors
    // ===================
    #[error("Failed to encode surface as PNG: {message}")]
    ImageEncode { message: String },

    // ===================
    // Config Errors
    // ===================
    #[error("Invalid configuration in {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },
}

impl CoreError {
    /// Actionable hint for the user, when one exists
    pub fn suggestion(&self) -> Option<String> {
        match self {
            CoreError::FileRead { path, .. } => Some(format!(
                "Check that the file exists and is readable: ls -l {}",
                path.display()
            )),
            CoreError::FileWrite { path, .. } => Some(format!(
                "Check write permissions for: {}",
                path.parent().unwrap_or(path).display()
            )),
            CoreError::PromptLoad { .. } => Some(
                "Point --prompts at a newline-delimited text file or a running `scribble serve`"
                    .to_string(),
            ),
            CoreError::InvalidConfig { path, .. } => Some(format!(
                "Fix or remove the config file: {}",
                path.display()
            )),
            _ => None,
        }
    }
}
