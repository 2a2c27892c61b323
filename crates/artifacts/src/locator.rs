use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use triage_protocol::ArtifactDescriptor;

use crate::provider::CiProvider;

static HINT_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^()]*)\)").expect("hint token pattern must compile"));
static RUN_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-\d+$").expect("run suffix pattern must compile"));

const LOG_PREFIXES: &[&str] = &["cy-logs-", "cypress-logs-"];

/// Artifacts worth downloading for one run, in provider order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactCandidates {
    pub screenshots: Vec<ArtifactDescriptor>,
    pub logs: Vec<ArtifactDescriptor>,
}

impl ArtifactCandidates {
    pub fn is_empty(&self) -> bool {
        self.screenshots.is_empty() && self.logs.is_empty()
    }

    /// Screenshot candidates followed by log candidates, each artifact once.
    pub fn union(&self) -> Vec<ArtifactDescriptor> {
        let mut seen = HashSet::new();
        self.screenshots
            .iter()
            .chain(&self.logs)
            .filter(|a| seen.insert(a.id))
            .cloned()
            .collect()
    }
}

pub fn is_screenshot_artifact(name: &str) -> bool {
    let name = name.to_lowercase();
    name.contains("screenshot")
        || name.contains("cypress")
        || (name.contains("cy-") && (name.contains("logs") || name.contains("artifacts")))
}

pub fn is_log_artifact(name: &str) -> bool {
    let name = name.to_lowercase();
    name.contains("cy-logs")
        || name.contains("cypress-logs")
        || (name.contains("cypress") && (name.contains("log") || name.contains("artifacts")))
}

/// Search token for a job hint: the parenthesized part of `"<job> (<token>)"`, else the whole
/// hint. Lowercased.
pub fn job_search_token(hint: &str) -> String {
    HINT_TOKEN
        .captures(hint)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|token| !token.is_empty())
        .unwrap_or_else(|| hint.trim())
        .to_lowercase()
}

/// A log artifact named after exactly this token, with or without a trailing `-<run number>`.
fn is_exact_log_match(name: &str, token: &str) -> bool {
    let name = name.to_lowercase();
    let base = RUN_SUFFIX.replace(&name, "");
    let matched = [name.as_str(), &*base].iter().any(|&candidate| {
        candidate == token
            || LOG_PREFIXES
                .iter()
                .any(|prefix| candidate.strip_prefix(*prefix) == Some(token))
    });
    matched
}

/// Classify a listing into candidate sets and narrow them to one job.
///
/// With a hint, screenshots that do not mention the token are dropped even when that leaves
/// nothing: evidence from another job would be attributed to the wrong test. Logs stop at the
/// first exact match; otherwise every log candidate mentioning the token is kept.
pub fn select_candidates(
    artifacts: &[ArtifactDescriptor],
    job_hint: Option<&str>,
) -> ArtifactCandidates {
    let screenshots: Vec<ArtifactDescriptor> = artifacts
        .iter()
        .filter(|a| is_screenshot_artifact(&a.name))
        .cloned()
        .collect();
    let logs: Vec<ArtifactDescriptor> = artifacts
        .iter()
        .filter(|a| is_log_artifact(&a.name))
        .cloned()
        .collect();

    let Some(token) = job_hint
        .map(job_search_token)
        .filter(|token| !token.is_empty())
    else {
        return ArtifactCandidates { screenshots, logs };
    };

    let screenshots: Vec<ArtifactDescriptor> = screenshots
        .into_iter()
        .filter(|a| a.name.to_lowercase().contains(&token))
        .collect();
    if screenshots.is_empty() {
        log::debug!("No screenshot artifacts match job token '{token}'");
    }

    let mut matched_logs = Vec::new();
    for artifact in logs {
        if is_exact_log_match(&artifact.name, &token) {
            return ArtifactCandidates {
                screenshots,
                logs: vec![artifact],
            };
        }
        if artifact.name.to_lowercase().contains(&token) {
            matched_logs.push(artifact);
        }
    }

    ArtifactCandidates {
        screenshots,
        logs: matched_logs,
    }
}

/// List a run's artifacts and select candidates. A failed listing means no candidates.
pub async fn locate(
    provider: &dyn CiProvider,
    run_id: u64,
    job_hint: Option<&str>,
) -> ArtifactCandidates {
    let artifacts = match provider.list_artifacts(run_id).await {
        Ok(artifacts) => artifacts,
        Err(err) => {
            log::warn!("No artifacts found for run {run_id}: {err}");
            return ArtifactCandidates::default();
        }
    };

    let candidates = select_candidates(&artifacts, job_hint);
    log::info!(
        "Run {run_id}: {} artifacts, {} screenshot candidates, {} log candidates",
        artifacts.len(),
        candidates.screenshots.len(),
        candidates.logs.len()
    );
    candidates
}
