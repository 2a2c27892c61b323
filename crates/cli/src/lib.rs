use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use triage_pipeline::{
    render_review_comment, render_slack_summary, TriageConfig, TriageReport,
};
use triage_protocol::{serialize_json_pretty, VerdictRecord};

mod collect;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "ci-triage")]
#[command(about = "Collect bounded failure evidence from CI test runs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect evidence for a failed workflow run and print it as JSON
    Collect(collect::CollectArgs),

    /// Render a collected report (and optional verdict) for people
    Summarize(SummarizeArgs),

    /// Classify a single failure message (offline)
    Classify(ClassifyArgs),
}

#[derive(Args)]
struct SummarizeArgs {
    /// Report JSON written by `collect`
    #[arg(long)]
    report: PathBuf,

    /// Verdict JSON from the reasoning step
    #[arg(long)]
    verdict: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = SummaryFormat::Slack)]
    format: SummaryFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum SummaryFormat {
    /// Short, capped chat message
    Slack,
    /// Review comment or issue body (needs --verdict)
    Markdown,
}

#[derive(Args)]
struct ClassifyArgs {
    /// Failure message; `-` reads it from stdin
    message: String,
}

pub async fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Collect(args) => collect::run_collect(args, config).await?,
        Commands::Summarize(args) => run_summarize(args, &config)?,
        Commands::Classify(args) => run_classify(args)?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<TriageConfig> {
    match path {
        Some(path) => TriageConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(TriageConfig::default()),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn run_summarize(args: SummarizeArgs, config: &TriageConfig) -> Result<()> {
    let report: TriageReport = read_json(&args.report)?;
    let verdict: Option<VerdictRecord> = match &args.verdict {
        Some(path) => {
            let record: VerdictRecord = read_json(path)?;
            record
                .validate()
                .with_context(|| format!("Invalid verdict in {}", path.display()))?;
            Some(record)
        }
        None => None,
    };

    let text = match args.format {
        SummaryFormat::Slack => {
            render_slack_summary(&report, verdict.as_ref(), config.max_slack_chars)
        }
        SummaryFormat::Markdown => {
            let verdict = verdict.context("--format markdown requires --verdict")?;
            render_review_comment(&report, &verdict)
        }
    };
    print_stdout(&text)
}

fn run_classify(args: ClassifyArgs) -> Result<()> {
    let message = if args.message == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read message from stdin")?;
        buf
    } else {
        args.message
    };

    let classification = triage_classifier::classify(&message);
    print_stdout(&serialize_json_pretty(&classification)?)
}
