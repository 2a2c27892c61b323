use async_trait::async_trait;
use triage_protocol::{ArtifactDescriptor, JobDescriptor};

use crate::error::Result;

/// Read access to one CI system's runs.
///
/// Every call may fail. Callers treat failures as missing evidence, never as fatal.
#[async_trait]
pub trait CiProvider: Send + Sync {
    /// All non-expired artifacts attached to a run, in provider order.
    async fn list_artifacts(&self, run_id: u64) -> Result<Vec<ArtifactDescriptor>>;

    /// Raw archive bytes of one artifact.
    async fn download_artifact(&self, artifact_id: u64) -> Result<Vec<u8>>;

    /// Plain-text log of one job.
    async fn download_job_log(&self, job_id: u64) -> Result<String>;

    async fn list_jobs(&self, run_id: u64) -> Result<Vec<JobDescriptor>>;
}
