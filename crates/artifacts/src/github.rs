use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use triage_protocol::{ArtifactDescriptor, JobDescriptor};

use crate::error::{ProviderError, Result};
use crate::provider::CiProvider;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const PAGE_SIZE: usize = 100;
const MAX_PAGES: u32 = 50;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// GitHub Actions over the REST API.
pub struct GithubProvider {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
}

impl GithubProvider {
    /// `repository` is `owner/repo`. `api_url` defaults to [`DEFAULT_API_URL`].
    pub fn new(repository: &str, token: Option<&str>, api_url: Option<&str>) -> Result<Self> {
        let (owner, repo) = repository
            .trim()
            .split_once('/')
            .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty() && !repo.contains('/'))
            .ok_or_else(|| {
                ProviderError::not_configured(format!(
                    "repository must be 'owner/repo', got '{repository}'"
                ))
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("ci-triage/", env!("CARGO_PKG_VERSION"))),
        );
        if let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ProviderError::not_configured("token contains invalid characters"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url
                .unwrap_or(DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    fn repo_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}{path}", self.api_url, self.owner, self.repo)
    }

    async fn get(&self, url: &str) -> Result<Response> {
        log::debug!("GET {url}");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.get(url).await?.bytes().await?;
        serde_json::from_slice(&body).map_err(|err| ProviderError::decode(url, err))
    }

    /// Follow `page=1,2,...` until a short page, the reported total, or the page ceiling.
    async fn collect_pages<P, I>(&self, path: &str, split: fn(P) -> (u64, Vec<I>)) -> Result<Vec<I>>
    where
        P: DeserializeOwned + Send,
        I: Send,
    {
        let mut items = Vec::new();
        for page in 1..=MAX_PAGES {
            let url = format!(
                "{}?per_page={PAGE_SIZE}&page={page}",
                self.repo_url(path)
            );
            let (total, batch) = split(self.get_json::<P>(&url).await?);
            let batch_len = batch.len();
            items.extend(batch);
            if listing_exhausted(batch_len, items.len(), total) {
                break;
            }
        }
        Ok(items)
    }
}

/// A short page ends the listing, as does reaching a reported (non-zero) `total_count`.
fn listing_exhausted(batch_len: usize, fetched: usize, total: u64) -> bool {
    batch_len < PAGE_SIZE || (total > 0 && fetched as u64 >= total)
}

#[derive(Debug, Deserialize)]
struct ArtifactPage {
    #[serde(default)]
    total_count: u64,
    #[serde(default)]
    artifacts: Vec<GithubArtifact>,
}

#[derive(Debug, Deserialize)]
struct GithubArtifact {
    id: u64,
    name: String,
    #[serde(default)]
    size_in_bytes: u64,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    expired: bool,
}

#[derive(Debug, Deserialize)]
struct JobPage {
    #[serde(default)]
    total_count: u64,
    #[serde(default)]
    jobs: Vec<JobDescriptor>,
}

/// Expired artifacts are listed by GitHub but can no longer be downloaded.
fn live_artifacts(artifacts: Vec<GithubArtifact>) -> Vec<ArtifactDescriptor> {
    artifacts
        .into_iter()
        .filter(|a| {
            if a.expired {
                log::debug!("Skipping expired artifact {} ({})", a.name, a.id);
            }
            !a.expired
        })
        .map(|a| ArtifactDescriptor {
            id: a.id,
            name: a.name,
            created_at: a.created_at,
            size_in_bytes: a.size_in_bytes,
        })
        .collect()
}

#[async_trait]
impl CiProvider for GithubProvider {
    async fn list_artifacts(&self, run_id: u64) -> Result<Vec<ArtifactDescriptor>> {
        let artifacts = self
            .collect_pages(
                &format!("/actions/runs/{run_id}/artifacts"),
                |page: ArtifactPage| (page.total_count, page.artifacts),
            )
            .await?;
        Ok(live_artifacts(artifacts))
    }

    async fn download_artifact(&self, artifact_id: u64) -> Result<Vec<u8>> {
        // GitHub answers with a redirect to short-lived blob storage; reqwest follows it and
        // drops the Authorization header when the host changes.
        let url = self.repo_url(&format!("/actions/artifacts/{artifact_id}/zip"));
        let body = self.get(&url).await?.bytes().await?;
        Ok(body.to_vec())
    }

    async fn download_job_log(&self, job_id: u64) -> Result<String> {
        let url = self.repo_url(&format!("/actions/jobs/{job_id}/logs"));
        Ok(self.get(&url).await?.text().await?)
    }

    async fn list_jobs(&self, run_id: u64) -> Result<Vec<JobDescriptor>> {
        self.collect_pages(
            &format!("/actions/runs/{run_id}/jobs"),
            |page: JobPage| (page.total_count, page.jobs),
        )
        .await
    }
}
