//! Error types shared by all three stages.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or unusable configuration, raised before any I/O
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The comment service answered with a non-success status
    #[error("API request failed: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Cannot access {}: {source}", path.display())]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input file is readable but does not have the expected shape
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Statistics error: {0}")]
    Stats(String),
}
