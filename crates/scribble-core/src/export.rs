//! Image export
//!
//! Saving is a pure export: it reads the surface and writes `<prompt>.png`,
//! never touching session state.

use crate::error::CoreError;
use crate::surface::Surface;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// File name used for a drawing of `prompt`
///
/// Path separators and control characters are replaced so the prompt cannot
/// escape the export directory.
pub fn export_file_name(prompt: &str) -> String {
    let stem: String = prompt
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let stem = stem.trim_matches('.');
    if stem.is_empty() {
        "drawing.png".to_string()
    } else {
        format!("{}.png", stem)
    }
}

/// Write the surface as PNG to `<dir>/<prompt>.png`
///
/// # Errors
/// Returns error if the surface cannot be encoded or the file cannot be written
pub fn export_png(surface: &Surface, prompt: &str, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let png = surface
        .encode_png()
        .context("Failed to encode drawing")?;

    let path = dir.join(export_file_name(prompt));
    if let Err(source) = std::fs::write(&path, png) {
        return Err(CoreError::FileWrite { path, source }.into());
    }

    tracing::info!(path = %path.display(), "Saved drawing");
    Ok(path)
}
