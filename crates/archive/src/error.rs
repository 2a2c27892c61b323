use thiserror::Error;

/// Result type for archive operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Errors that can occur while reading an artifact archive
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The byte stream is not a readable zip archive
    #[error("Corrupt archive: {0}")]
    Corrupt(String),

    /// An entry exceeds the caller's read limit
    #[error("Entry too large: {path} ({size} bytes, limit {limit})")]
    EntryTooLarge { path: String, size: u64, limit: u64 },

    /// An entry is not valid UTF-8 text
    #[error("Entry is not valid text: {path}")]
    Decode { path: String },

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }

    pub fn decode(path: impl Into<String>) -> Self {
        Self::Decode { path: path.into() }
    }
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        // Archives are read from memory, so an IO failure here means truncated or bad data.
        Self::Corrupt(err.to_string())
    }
}
