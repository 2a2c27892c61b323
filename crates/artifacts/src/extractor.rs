use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use triage_archive::{ArchiveEntry, ArchiveError, ArchiveReader};
use triage_protocol::{ArtifactDescriptor, Screenshot};

use crate::error::ExtractError;
use crate::provider::CiProvider;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov"];
const TEXT_EXTENSIONS: &[&str] = &["txt", "log"];
const SCREENSHOT_HINTS: &[&str] = &[
    "screenshot",
    "failure",
    "error",
    "(failed)",
    "cypress/screenshots/",
];

/// What an archive member is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRole {
    /// Failure screenshot, forwarded as base64.
    Image,
    /// Listed by name only, never decompressed.
    Video,
    /// Decoded and included in the text blob.
    Text,
    /// Listed by name only.
    Other,
}

pub fn entry_role(entry: &ArchiveEntry) -> EntryRole {
    let path = entry.path.to_lowercase();
    let ext = entry.extension().unwrap_or_default();

    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return if SCREENSHOT_HINTS.iter().any(|hint| path.contains(hint)) {
            EntryRole::Image
        } else {
            EntryRole::Other
        };
    }
    if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        return EntryRole::Video;
    }
    if TEXT_EXTENSIONS.contains(&ext.as_str()) || path.contains("output") || path.contains(".json")
    {
        return EntryRole::Text;
    }
    EntryRole::Other
}

/// Per-entry read caps and download parallelism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractLimits {
    pub max_screenshot_bytes: u64,
    pub max_text_entry_bytes: u64,
    pub max_concurrent_downloads: usize,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            max_screenshot_bytes: 5 * 1024 * 1024,
            max_text_entry_bytes: 20 * 1024 * 1024,
            max_concurrent_downloads: 4,
        }
    }
}

/// Everything usable from one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArtifact {
    pub artifact_name: String,
    pub screenshots: Vec<Screenshot>,
    /// Human-readable manifest with the decoded text entries, see [`extract_archive`].
    pub text_blob: String,
}

/// Read one artifact archive.
///
/// The text blob starts with a header and per-role counts, then every decoded text entry under a
/// `--- <path> ---` line, then the screenshot, video and other file listings. Text entries that
/// are not valid UTF-8 or exceed the size cap are skipped. Images above the screenshot cap are
/// skipped. Videos are never read.
pub fn extract_archive(
    artifact_name: &str,
    bytes: Vec<u8>,
    limits: &ExtractLimits,
) -> Result<ExtractedArtifact, ArchiveError> {
    let mut reader = ArchiveReader::open(bytes)?;
    let entries: Vec<ArchiveEntry> = reader
        .entries()
        .iter()
        .filter(|e| !e.is_dir)
        .cloned()
        .collect();

    let mut texts: Vec<(String, String)> = Vec::new();
    let mut screenshots = Vec::new();
    let mut image_paths = Vec::new();
    let mut video_paths = Vec::new();
    let mut other_paths = Vec::new();
    let mut text_entries = 0usize;

    for entry in &entries {
        match entry_role(entry) {
            EntryRole::Image => {
                image_paths.push(entry.path.clone());
                match reader.read_limited(entry, limits.max_screenshot_bytes) {
                    Ok(data) => screenshots.push(Screenshot {
                        name: entry.file_name().to_string(),
                        path: entry.path.clone(),
                        base64: STANDARD.encode(data),
                        timestamp: entry.modified.clone(),
                    }),
                    Err(err) => log::debug!("{artifact_name}: skipping image: {err}"),
                }
            }
            EntryRole::Video => video_paths.push(entry.path.clone()),
            EntryRole::Text => {
                text_entries += 1;
                match reader.read_text(entry, limits.max_text_entry_bytes) {
                    Ok(text) => texts.push((entry.path.clone(), text)),
                    Err(err) => log::debug!("{artifact_name}: skipping text entry: {err}"),
                }
            }
            EntryRole::Other => other_paths.push(entry.path.clone()),
        }
    }

    let mut blob = String::new();
    let _ = writeln!(blob, "=== Artifact: {artifact_name} ===");
    let _ = writeln!(
        blob,
        "Entries: {} text, {} screenshots, {} videos, {} other",
        text_entries,
        image_paths.len(),
        video_paths.len(),
        other_paths.len()
    );
    for (path, text) in &texts {
        let _ = write!(blob, "\n--- {path} ---\n{}\n", text.trim_end());
    }
    for (title, paths) in [
        ("Screenshots", &image_paths),
        ("Videos", &video_paths),
        ("Other files", &other_paths),
    ] {
        if paths.is_empty() {
            continue;
        }
        let _ = writeln!(blob, "\n{title}:");
        for path in paths {
            let _ = writeln!(blob, "- {path}");
        }
    }

    log::debug!(
        "{artifact_name}: {} entries, {} text decoded, {} screenshots",
        entries.len(),
        texts.len(),
        screenshots.len()
    );

    Ok(ExtractedArtifact {
        artifact_name: artifact_name.to_string(),
        screenshots,
        text_blob: blob.trim_end().to_string(),
    })
}

/// Download and read one artifact.
pub async fn extract(
    provider: &dyn CiProvider,
    artifact: &ArtifactDescriptor,
    limits: &ExtractLimits,
) -> Result<ExtractedArtifact, ExtractError> {
    let bytes = provider.download_artifact(artifact.id).await?;
    log::debug!("Downloaded {} ({} bytes)", artifact.name, bytes.len());
    Ok(extract_archive(&artifact.name, bytes, limits)?)
}

/// Result of extracting one artifact, kept alongside its descriptor.
#[derive(Debug)]
pub struct ArtifactOutcome {
    pub artifact: ArtifactDescriptor,
    pub result: Result<ExtractedArtifact, ExtractError>,
}

/// Extract every artifact concurrently.
///
/// Outcomes come back in the order of `artifacts` regardless of completion order. Failures are
/// logged as warnings and kept as `Err` outcomes.
pub async fn extract_all(
    provider: Arc<dyn CiProvider>,
    artifacts: &[ArtifactDescriptor],
    limits: ExtractLimits,
) -> Vec<ArtifactOutcome> {
    let permits = Arc::new(Semaphore::new(limits.max_concurrent_downloads.max(1)));
    let mut tasks = JoinSet::new();
    for (idx, artifact) in artifacts.iter().cloned().enumerate() {
        let provider = Arc::clone(&provider);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            (idx, extract(provider.as_ref(), &artifact, &limits).await)
        });
    }

    let mut slots: Vec<Option<Result<ExtractedArtifact, ExtractError>>> =
        artifacts.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((idx, result)) => slots[idx] = Some(result),
            Err(err) => log::warn!("Artifact extraction task failed: {err}"),
        }
    }

    artifacts
        .iter()
        .cloned()
        .zip(slots)
        .map(|(artifact, slot)| {
            let result = slot.unwrap_or_else(|| {
                Err(ExtractError::Task(format!(
                    "no result for artifact {}",
                    artifact.name
                )))
            });
            if let Err(err) = &result {
                log::warn!("Skipping artifact {} ({}): {err}", artifact.name, artifact.id);
            }
            ArtifactOutcome { artifact, result }
        })
        .collect()
}
