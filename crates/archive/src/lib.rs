//! # Triage Archive
//!
//! Opens CI artifact archives (zip) and exposes their members as a navigable list.
//!
//! The reader is decoupled from how the bytes were obtained: callers download an artifact,
//! hand the bytes to [`ArchiveReader::open`], classify entries by path and only then pull the
//! payloads they care about.
//!
//! ```rust
//! use triage_archive::{zip_entries, ArchiveReader};
//!
//! let bytes = zip_entries(&[("logs/output.txt", b"Error: boom")]).unwrap();
//! let mut reader = ArchiveReader::open(bytes).unwrap();
//! let entry = reader.entries()[0].clone();
//! assert_eq!(reader.read_text(&entry, 1024).unwrap(), "Error: boom");
//! ```

mod error;
mod reader;

pub use error::{ArchiveError, Result};
pub use reader::{is_zip_magic, zip_entries, ArchiveEntry, ArchiveReader};
