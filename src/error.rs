//! Error types for wavefarm.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for wavefarm.
#[derive(Error, Debug)]
#[allow(dead_code)]
pub enum WavefarmError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Preset directory not found or not a directory: {0}")]
    PresetDirNotFound(PathBuf),

    #[error("Invalid preset '{path}': {reason}")]
    InvalidPreset { path: PathBuf, reason: String },

    #[error("Render failed: {0}")]
    Render(String),

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for wavefarm operations.
pub type Result<T> = std::result::Result<T, WavefarmError>;
