use std::io::{Cursor, Read, Write};

use zip::ZipArchive;

use crate::error::{ArchiveError, Result};

/// ZIP signatures are `PK..` (local header, central directory, end of central dir, spanning).
pub fn is_zip_magic(header: &[u8]) -> bool {
    if header.len() < 4 {
        return false;
    }
    if header[0] != b'P' || header[1] != b'K' {
        return false;
    }
    matches!((header[2], header[3]), (1, 2) | (3, 4) | (5, 6) | (7, 8))
}

/// Central-directory metadata for one archive member. Payload bytes are not held here; they are
/// read on demand through [`ArchiveReader::read`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub index: usize,
    pub path: String,
    pub is_dir: bool,
    /// Uncompressed size as declared by the archive (untrusted).
    pub size: u64,
    /// Last-modified time from the entry header, `YYYY-MM-DDTHH:MM:SS`.
    pub modified: Option<String>,
}

impl ArchiveEntry {
    /// File name without directories.
    pub fn file_name(&self) -> &str {
        let trimmed = self.path.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }

    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// Reader over an in-memory zip archive.
///
/// Opening parses only the central directory. Member payloads are decompressed one at a time
/// when the caller asks for them, so archives holding large videos cost nothing beyond their
/// directory until something is actually read.
pub struct ArchiveReader {
    archive: ZipArchive<Cursor<Vec<u8>>>,
    entries: Vec<ArchiveEntry>,
}

impl ArchiveReader {
    pub fn open(bytes: Vec<u8>) -> Result<Self> {
        if !is_zip_magic(&bytes) {
            return Err(ArchiveError::corrupt("missing zip signature"));
        }

        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let file = archive.by_index_raw(index)?;
            let modified = file.last_modified();
            entries.push(ArchiveEntry {
                index,
                path: file.name().replace('\\', "/"),
                is_dir: file.is_dir(),
                size: file.size(),
                modified: Some(format!(
                    "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
                    modified.year(),
                    modified.month(),
                    modified.day(),
                    modified.hour(),
                    modified.minute(),
                    modified.second()
                )),
            });
        }

        log::debug!("Opened archive with {} entries", entries.len());
        Ok(Self { archive, entries })
    }

    /// Entries in central-directory order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decompress one entry.
    pub fn read(&mut self, entry: &ArchiveEntry) -> Result<Vec<u8>> {
        self.read_limited(entry, u64::MAX)
    }

    /// Decompress one entry, refusing anything larger than `limit` bytes.
    ///
    /// The declared size is checked first; the actual stream is capped as well since declared
    /// sizes are untrusted.
    pub fn read_limited(&mut self, entry: &ArchiveEntry, limit: u64) -> Result<Vec<u8>> {
        if entry.size > limit {
            return Err(ArchiveError::EntryTooLarge {
                path: entry.path.clone(),
                size: entry.size,
                limit,
            });
        }

        let file = self.archive.by_index(entry.index)?;
        let mut buf = Vec::with_capacity(usize::try_from(entry.size).unwrap_or(0).min(1 << 20));
        file.take(limit.saturating_add(1))
            .read_to_end(&mut buf)
            .map_err(|err| ArchiveError::corrupt(format!("{}: {err}", entry.path)))?;

        let actual = u64::try_from(buf.len()).unwrap_or(u64::MAX);
        if actual > limit {
            return Err(ArchiveError::EntryTooLarge {
                path: entry.path.clone(),
                size: actual,
                limit,
            });
        }
        Ok(buf)
    }

    /// Decompress one entry and decode it as UTF-8 text.
    pub fn read_text(&mut self, entry: &ArchiveEntry, limit: u64) -> Result<String> {
        let bytes = self.read_limited(entry, limit)?;
        String::from_utf8(bytes).map_err(|_| ArchiveError::decode(&entry.path))
    }
}

/// Build a zip archive in memory. Names ending in `/` become directory entries.
pub fn zip_entries(entries: &[(&str, &[u8])]) -> Result<Vec<u8>> {
    fn io_err(err: zip::result::ZipError) -> ArchiveError {
        ArchiveError::Io(std::io::Error::new(std::io::ErrorKind::Other, err))
    }

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default();
    for (name, bytes) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).map_err(io_err)?;
            continue;
        }
        writer.start_file(*name, options).map_err(io_err)?;
        writer.write_all(bytes)?;
    }
    let cursor = writer.finish().map_err(io_err)?;
    Ok(cursor.into_inner())
}
