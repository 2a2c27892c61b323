//! # Triage Artifacts
//!
//! Everything that touches the CI provider:
//!
//! - [`CiProvider`]: listing and downloading run artifacts and job logs ([`GithubProvider`] for
//!   GitHub Actions)
//! - [`locate`]: naming heuristics and job-hint narrowing over a run's artifact listing
//! - [`extract_all`]: concurrent download and inspection of the located artifacts, with results
//!   returned in listing order
//!
//! Provider failures never escape as errors from [`locate`] or [`extract_all`]; they are logged
//! and surface as empty candidates or `Err` outcomes.

mod error;
mod extractor;
mod github;
mod locator;
mod provider;

pub use error::{ExtractError, ProviderError, Result};
pub use extractor::{
    entry_role, extract, extract_all, extract_archive, ArtifactOutcome, EntryRole,
    ExtractLimits, ExtractedArtifact,
};
pub use github::{GithubProvider, DEFAULT_API_URL};
pub use locator::{
    is_log_artifact, is_screenshot_artifact, job_search_token, locate, select_candidates,
    ArtifactCandidates,
};
pub use provider::CiProvider;
