use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use triage_artifacts::ExtractLimits;
use triage_evidence::{EvidenceBudget, DEFAULT_CONTEXT_WINDOW};

use crate::error::{Result, TriageError};
use crate::reasoning::RetryPolicy;

const MAX_LOG_WINDOW: usize = 200;
const MIN_SLACK_CHARS: usize = 200;

/// Tuning for one triage run. Every field may be omitted from a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TriageConfig {
    /// Lines kept on each side of an error line
    pub log_window: usize,

    /// Soft cap on artifact-sourced log text before context extraction
    pub max_log_chars: usize,

    /// Hard cap on the serialized structured summary
    pub max_summary_chars: usize,

    /// Cap on the log excerpt inside the summary
    pub max_excerpt_chars: usize,

    /// Cap on the Slack-formatted summary
    pub max_slack_chars: usize,

    pub max_screenshots: usize,

    pub max_screenshot_bytes: u64,

    /// Failed-job logs fetched per run
    pub max_job_logs: usize,

    pub max_concurrent_downloads: usize,

    pub reasoning: ReasoningConfig,
}

impl Default for TriageConfig {
    fn default() -> Self {
        let budget = EvidenceBudget::default();
        let limits = ExtractLimits::default();
        Self {
            log_window: DEFAULT_CONTEXT_WINDOW,
            max_log_chars: 50_000,
            max_summary_chars: budget.max_summary_chars,
            max_excerpt_chars: budget.max_excerpt_chars,
            max_slack_chars: 3_000,
            max_screenshots: budget.max_screenshots,
            max_screenshot_bytes: limits.max_screenshot_bytes,
            max_job_logs: 3,
            max_concurrent_downloads: limits.max_concurrent_downloads,
            reasoning: ReasoningConfig::default(),
        }
    }
}

/// Retry settings for the reasoning collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReasoningConfig {
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 2_000,
        }
    }
}

impl ReasoningConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: Duration::from_millis(self.backoff_ms),
        }
    }
}

impl TriageConfig {
    /// Parse TOML and validate.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|err| TriageError::invalid_config(err.to_string()))?;
        config.validate().map_err(TriageError::InvalidConfig)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| TriageError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.evidence_budget().validate()?;

        if self.log_window > MAX_LOG_WINDOW {
            return Err(format!(
                "log_window ({}) cannot exceed {MAX_LOG_WINDOW}",
                self.log_window
            ));
        }
        if self.max_log_chars == 0 {
            return Err("max_log_chars must be > 0".to_string());
        }
        if self.max_slack_chars < MIN_SLACK_CHARS {
            return Err(format!(
                "max_slack_chars ({}) must be at least {MIN_SLACK_CHARS}",
                self.max_slack_chars
            ));
        }
        if self.max_concurrent_downloads == 0 {
            return Err("max_concurrent_downloads must be > 0".to_string());
        }
        if self.reasoning.max_attempts == 0 {
            return Err("reasoning.max_attempts must be > 0".to_string());
        }

        Ok(())
    }

    pub fn evidence_budget(&self) -> EvidenceBudget {
        EvidenceBudget {
            max_summary_chars: self.max_summary_chars,
            max_excerpt_chars: self.max_excerpt_chars,
            max_screenshots: self.max_screenshots,
        }
    }

    pub fn extract_limits(&self) -> ExtractLimits {
        ExtractLimits {
            max_screenshot_bytes: self.max_screenshot_bytes,
            max_concurrent_downloads: self.max_concurrent_downloads,
            ..ExtractLimits::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        let config = TriageConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.log_window, 10);
        assert_eq!(config.max_log_chars, 50_000);
        assert_eq!(config.max_summary_chars, 30_000);
        assert_eq!(config.max_slack_chars, 3_000);
        assert_eq!(config.max_screenshots, 5);
        assert_eq!(config.reasoning.retry_policy().backoff, Duration::from_secs(2));
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let config = TriageConfig::from_toml_str(
            r#"
            log_window = 4
            max_slack_chars = 1500

            [reasoning]
            max_attempts = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.log_window, 4);
        assert_eq!(config.max_slack_chars, 1_500);
        assert_eq!(config.reasoning.max_attempts, 5);
        assert_eq!(config.reasoning.backoff_ms, 2_000);
        assert_eq!(config.max_summary_chars, 30_000);
    }

    #[test]
    fn unknown_keys_and_bad_values_are_rejected() {
        assert!(matches!(
            TriageConfig::from_toml_str("log_windw = 3"),
            Err(TriageError::InvalidConfig(_))
        ));
        assert!(matches!(
            TriageConfig::from_toml_str("max_summary_chars = 10"),
            Err(TriageError::InvalidConfig(_))
        ));
        assert!(matches!(
            TriageConfig::from_toml_str("max_excerpt_chars = 20"),
            Err(TriageError::InvalidConfig(_))
        ));
        assert!(matches!(
            TriageConfig::from_toml_str("[reasoning]\nmax_attempts = 0"),
            Err(TriageError::InvalidConfig(_))
        ));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triage.toml");
        std::fs::write(&path, "max_job_logs = 1\n").unwrap();
        assert_eq!(TriageConfig::load(&path).unwrap().max_job_logs, 1);

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            TriageConfig::load(&missing),
            Err(TriageError::ConfigRead { .. })
        ));
    }
}
