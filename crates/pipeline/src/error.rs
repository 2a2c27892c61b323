use std::path::PathBuf;
use thiserror::Error;

/// Result type for pipeline setup
pub type Result<T> = std::result::Result<T, TriageError>;

/// Caller-side mistakes. Everything that goes wrong during collection degrades instead.
#[derive(Error, Debug)]
pub enum TriageError {
    /// Not a run number or a workflow run URL
    #[error("Invalid run identifier '{input}': {reason}")]
    InvalidRunId { input: String, reason: String },

    /// Configuration values are out of range or unparsable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TriageError {
    pub fn invalid_run_id(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRunId {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
