use std::io;

use thiserror::Error;

/// Rejections surfaced synchronously by `WaterfallEngine::start`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StartError {
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("no credential available; sign in first")]
    MissingCredential,
    #[error("engine is already running")]
    AlreadyRunning,
    #[error("concurrency must be at least 1")]
    InvalidConcurrency,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded: {needed} bytes needed, {limit} allowed")]
    QuotaExceeded { needed: usize, limit: usize },
    #[error("storage directory missing or not writable: {0}")]
    Unavailable(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
