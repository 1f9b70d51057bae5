use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlcollectError {
    #[error("Playlist provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Playlist provider rejected the request (code {code}): {message}")]
    ProviderRejected { code: i64, message: String },

    #[error("Malformed playlist provider response: {0}")]
    ProviderResponse(String),

    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Invalid name {0:?}: nothing left after removing reserved characters")]
    InvalidName(String),

    #[error("Failed to copy '{track}' from {}: {cause}", .source_path.display())]
    CopyFailed {
        track: String,
        source_path: PathBuf,
        cause: String,
    },

    #[error("Run cancelled by operator")]
    Cancelled,

    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid settings: {0}")]
    Settings(String),

    #[error("Worker pool Error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Prompt Error: {0}")]
    Prompt(String),

    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PlcollectError>;
