use anyhow::{Context as AnyhowContext, Result};
use clap::Args;
use std::env;
use std::sync::Arc;
use triage_artifacts::{GithubProvider, DEFAULT_API_URL};
use triage_pipeline::{RunRef, Triage, TriageConfig, TriageRequest};
use triage_protocol::{serialize_json, serialize_json_pretty};

use crate::print_stdout;

#[derive(Args)]
pub(crate) struct CollectArgs {
    /// Run id or workflow run URL (https://github.com/<owner>/<repo>/actions/runs/<id>)
    run: String,

    /// Repository as owner/repo (default: taken from the run URL, then GITHUB_REPOSITORY)
    #[arg(long)]
    repo: Option<String>,

    /// Job name hint, e.g. "previewUrlTest (checkout.cy.ts)"
    #[arg(long)]
    job: Option<String>,

    /// Known failure message; skips picking one from the logs
    #[arg(long)]
    error_message: Option<String>,

    /// API token (default: GITHUB_TOKEN, then GH_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// API base URL (default: GITHUB_API_URL, then https://api.github.com)
    #[arg(long)]
    api_url: Option<String>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) async fn run_collect(args: CollectArgs, config: TriageConfig) -> Result<()> {
    let run: RunRef = args.run.parse()?;

    let repository = run
        .repository
        .clone()
        .or(args.repo)
        .or_else(|| env_non_empty("GITHUB_REPOSITORY"))
        .context("Repository unknown: pass --repo owner/repo, a run URL, or set GITHUB_REPOSITORY")?;
    let token = args
        .token
        .or_else(|| env_non_empty("GITHUB_TOKEN"))
        .or_else(|| env_non_empty("GH_TOKEN"));
    if token.is_none() {
        log::warn!("No GitHub token configured; artifact downloads will likely fail");
    }
    let api_url = args
        .api_url
        .or_else(|| env_non_empty("GITHUB_API_URL"))
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    let provider = GithubProvider::new(&repository, token.as_deref(), Some(&api_url))
        .context("Failed to set up GitHub client")?;
    let triage = Triage::new(Arc::new(provider), config).with_repository(&repository);

    log::info!("Collecting evidence for {repository} run {}", run.run_id);
    let report = triage
        .run(&TriageRequest {
            run_id: run.run_id,
            job_hint: args.job,
            error_message: args.error_message,
        })
        .await;

    let json = if args.pretty {
        serialize_json_pretty(&report)?
    } else {
        serialize_json(&report)?
    };
    print_stdout(&json)
}
