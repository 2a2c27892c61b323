use thiserror::Error;
use triage_archive::ArchiveError;

/// Result type for CI provider calls
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors returned by a [`crate::CiProvider`]
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Transport-level failure (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status (auth, rate limit, not found)
    #[error("{url} returned HTTP {status}")]
    Status { status: u16, url: String },

    /// The response body did not have the expected shape
    #[error("Unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    /// Required provider settings are missing
    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    pub fn decode(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            url: url.into(),
            message: err.to_string(),
        }
    }

    pub fn not_configured(msg: impl Into<String>) -> Self {
        Self::NotConfigured(msg.into())
    }
}

/// Why one artifact produced no content
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("download failed: {0}")]
    Download(#[from] ProviderError),

    #[error("unreadable archive: {0}")]
    Archive(#[from] ArchiveError),

    /// The extraction task ended without reporting a result
    #[error("extraction task failed: {0}")]
    Task(String),
}
