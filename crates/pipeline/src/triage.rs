use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use triage_artifacts::{extract_all, job_search_token, locate, ArtifactOutcome, CiProvider};
use triage_classifier::{classify, Classification};
use triage_evidence::{assemble, extract_context, truncate_with_marker};
use triage_protocol::{ErrorData, JobDescriptor, Screenshot, EVIDENCE_SCHEMA_VERSION};

use crate::config::TriageConfig;
use crate::signals::{derive_file_name, derive_test_name, pick_error_message, strip_timestamp};

/// What to triage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriageRequest {
    pub run_id: u64,
    /// Job name, usually `"<job> (<spec file>)"`.
    pub job_hint: Option<String>,
    /// Known failure message; skips picking one from the logs.
    pub error_message: Option<String>,
}

/// How one located artifact fared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactReport {
    pub id: u64,
    pub name: String,
    pub screenshots: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of one triage run: the evidence for the reasoning step plus collection metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageReport {
    pub schema_version: u32,
    pub run_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_hint: Option<String>,
    /// Nothing at all was found: no artifacts, no job logs, no message.
    #[serde(default)]
    pub no_evidence: bool,
    #[serde(default)]
    pub artifacts: Vec<ArtifactReport>,
    /// Names of the jobs whose logs were read.
    #[serde(default)]
    pub job_logs: Vec<String>,
    pub error_data: ErrorData,
}

/// Evidence collection for one provider.
pub struct Triage {
    provider: Arc<dyn CiProvider>,
    config: TriageConfig,
    repository: Option<String>,
}

impl Triage {
    pub fn new(provider: Arc<dyn CiProvider>, config: TriageConfig) -> Self {
        Self {
            provider,
            config,
            repository: None,
        }
    }

    /// Recorded in reports only.
    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    pub fn config(&self) -> &TriageConfig {
        &self.config
    }

    /// Collect and assemble evidence. Provider failures degrade to less evidence; this never
    /// fails.
    pub async fn run(&self, request: &TriageRequest) -> TriageReport {
        let run_id = request.run_id;
        let job_hint = request
            .job_hint
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty());

        let candidates = locate(self.provider.as_ref(), run_id, job_hint).await;
        let to_extract = candidates.union();
        let outcomes = extract_all(
            Arc::clone(&self.provider),
            &to_extract,
            self.config.extract_limits(),
        )
        .await;

        let screenshot_ids: HashSet<u64> = candidates.screenshots.iter().map(|a| a.id).collect();
        let log_ids: HashSet<u64> = candidates.logs.iter().map(|a| a.id).collect();
        let collected = fold_outcomes(outcomes, &screenshot_ids, &log_ids);

        let artifact_text =
            truncate_with_marker(&collected.texts.join("\n\n"), self.config.max_log_chars);
        let job_logs = self.fetch_job_logs(run_id, job_hint).await;

        let mut lines: Vec<&str> = artifact_text.lines().collect();
        for (_, log) in &job_logs {
            lines.extend(log.lines().map(strip_timestamp));
        }
        let context = extract_context(&lines, self.config.log_window);

        let message = request
            .error_message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .or_else(|| pick_error_message(&context))
            .unwrap_or_default();

        let no_evidence = collected.screenshots.is_empty()
            && artifact_text.trim().is_empty()
            && job_logs.is_empty()
            && message.is_empty();
        let classification = if no_evidence {
            log::warn!("Run {run_id}: no artifacts, job logs or error message available");
            Classification::unknown()
        } else {
            classify(&message)
        };

        let budget = self.config.evidence_budget();
        let summary = assemble(
            &message,
            &collected.screenshots,
            &context,
            &classification,
            &budget,
        );

        let hint_token = job_hint.map(job_search_token);
        let file_name = derive_file_name(
            hint_token
                .as_deref()
                .into_iter()
                .chain(to_extract.iter().map(|a| a.name.as_str()))
                .chain(context.iter().map(String::as_str)),
        );
        let test_name = derive_test_name(&lines);

        let mut screenshots = collected.screenshots;
        screenshots.truncate(self.config.max_screenshots);

        log::info!(
            "Run {run_id}: {} / {}, {} screenshots, {} context lines",
            summary.error_type,
            summary.test_issue_category,
            screenshots.len(),
            context.len()
        );

        TriageReport {
            schema_version: EVIDENCE_SCHEMA_VERSION,
            run_id,
            repository: self.repository.clone(),
            job_hint: job_hint.map(str::to_string),
            no_evidence,
            artifacts: collected.reports,
            job_logs: job_logs.into_iter().map(|(name, _)| name).collect(),
            error_data: ErrorData {
                message,
                test_name,
                file_name,
                screenshots,
                summary,
            },
        }
    }

    /// Logs of the hinted job, or of failed jobs when no job matches the hint.
    async fn fetch_job_logs(&self, run_id: u64, job_hint: Option<&str>) -> Vec<(String, String)> {
        if self.config.max_job_logs == 0 {
            return Vec::new();
        }
        let jobs = match self.provider.list_jobs(run_id).await {
            Ok(jobs) => jobs,
            Err(err) => {
                log::warn!("Could not list jobs for run {run_id}: {err}");
                return Vec::new();
            }
        };

        let selected = select_jobs(&jobs, job_hint, self.config.max_job_logs);
        let mut logs = Vec::with_capacity(selected.len());
        for job in selected {
            match self.provider.download_job_log(job.id).await {
                Ok(text) => {
                    log::debug!("Job log {} ({} bytes)", job.name, text.len());
                    logs.push((job.name.clone(), text));
                }
                Err(err) => log::warn!("Could not download log for job {}: {err}", job.name),
            }
        }
        logs
    }
}

fn select_jobs<'a>(
    jobs: &'a [JobDescriptor],
    job_hint: Option<&str>,
    limit: usize,
) -> Vec<&'a JobDescriptor> {
    if let Some(hint) = job_hint {
        let token = job_search_token(hint);
        let matched: Vec<&JobDescriptor> = jobs
            .iter()
            .filter(|job| {
                job.name.eq_ignore_ascii_case(hint) || job.name.to_lowercase().contains(&token)
            })
            .take(limit)
            .collect();
        if !matched.is_empty() {
            return matched;
        }
    }
    jobs.iter().filter(|job| job.failed()).take(limit).collect()
}

#[derive(Default)]
struct Collected {
    screenshots: Vec<Screenshot>,
    texts: Vec<String>,
    reports: Vec<ArtifactReport>,
}

/// Fold outcomes in list order. Screenshots only come from screenshot candidates and text only
/// from log candidates.
fn fold_outcomes(
    outcomes: Vec<ArtifactOutcome>,
    screenshot_ids: &HashSet<u64>,
    log_ids: &HashSet<u64>,
) -> Collected {
    let mut collected = Collected::default();
    for ArtifactOutcome { artifact, result } in outcomes {
        match result {
            Ok(extracted) => {
                let mut taken = 0;
                if screenshot_ids.contains(&artifact.id) {
                    taken = extracted.screenshots.len();
                    collected.screenshots.extend(extracted.screenshots);
                }
                if log_ids.contains(&artifact.id) && !extracted.text_blob.is_empty() {
                    collected.texts.push(extracted.text_blob);
                }
                collected.reports.push(ArtifactReport {
                    id: artifact.id,
                    name: artifact.name,
                    screenshots: taken,
                    error: None,
                });
            }
            Err(err) => collected.reports.push(ArtifactReport {
                id: artifact.id,
                name: artifact.name,
                screenshots: 0,
                error: Some(err.to_string()),
            }),
        }
    }
    collected
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn job(id: u64, name: &str, conclusion: &str) -> JobDescriptor {
        JobDescriptor {
            id,
            name: name.to_string(),
            status: Some("completed".to_string()),
            conclusion: Some(conclusion.to_string()),
        }
    }

    #[test]
    fn hinted_job_wins_over_failed_jobs() {
        let jobs = vec![
            job(1, "lint", "failure"),
            job(2, "previewUrlTest (checkout.cy.ts)", "failure"),
            job(3, "previewUrlTest (login.cy.ts)", "success"),
        ];
        let picked = select_jobs(&jobs, Some("previewUrlTest (checkout.cy.ts)"), 3);
        let ids: Vec<u64> = picked.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn failed_jobs_without_a_matching_hint() {
        let jobs = vec![
            job(1, "lint", "failure"),
            job(2, "unit", "success"),
            job(3, "e2e", "timed_out"),
            job(4, "deploy", "cancelled"),
        ];
        let ids: Vec<u64> = select_jobs(&jobs, Some("nothing (cart.cy.ts)"), 2)
            .iter()
            .map(|j| j.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(select_jobs(&jobs, None, 0).is_empty());
    }
}
