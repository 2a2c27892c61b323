use anyhow::{anyhow, Context as _, Result};
use async_trait::async_trait;
use std::time::Duration;
use triage_protocol::{ErrorData, VerdictRecord};

/// The step that turns evidence into a verdict. Treated as unreliable.
#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn analyze(&self, data: &ErrorData) -> Result<VerdictRecord>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Call `reasoner` until it returns a valid record or the attempts run out.
///
/// A record that fails [`VerdictRecord::validate`] counts as a failed attempt.
pub async fn analyze_with_retry(
    reasoner: &dyn Reasoner,
    data: &ErrorData,
    policy: RetryPolicy,
) -> Result<VerdictRecord> {
    let attempts = policy.max_attempts.max(1);
    let mut last_err = None;

    for attempt in 1..=attempts {
        let outcome = reasoner
            .analyze(data)
            .await
            .and_then(|record| record.validate().map(|()| record));
        match outcome {
            Ok(record) => {
                log::info!(
                    "Verdict {} ({}%) after {attempt} attempt(s)",
                    record.verdict,
                    record.confidence
                );
                return Ok(record);
            }
            Err(err) => {
                log::warn!("Reasoning attempt {attempt}/{attempts} failed: {err:#}");
                last_err = Some(err);
                if attempt < attempts {
                    tokio::time::sleep(policy.backoff).await;
                }
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow!("no reasoning attempts were made")))
        .with_context(|| format!("Reasoning failed after {attempts} attempts"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicU32, Ordering};
    use triage_protocol::{StructuredErrorSummary, Verdict};

    /// Fails the first `failures` calls, then answers with `confidence`.
    struct Flaky {
        failures: u32,
        confidence: u8,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Reasoner for Flaky {
        async fn analyze(&self, _data: &ErrorData) -> Result<VerdictRecord> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                anyhow::bail!("upstream 503");
            }
            Ok(VerdictRecord {
                verdict: Verdict::TestIssue,
                confidence: self.confidence,
                reasoning: "selector drifted".to_string(),
                root_cause: None,
                changes: Vec::new(),
            })
        }
    }

    fn data() -> ErrorData {
        ErrorData {
            message: "Timed out".to_string(),
            test_name: None,
            file_name: None,
            screenshots: Vec::new(),
            summary: StructuredErrorSummary::empty(),
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn retries_until_success() {
        let reasoner = Flaky {
            failures: 2,
            confidence: 80,
            calls: AtomicU32::new(0),
        };
        let record = analyze_with_retry(&reasoner, &data(), policy(3)).await.unwrap();
        assert_eq!(record.confidence, 80);
        assert_eq!(reasoner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let reasoner = Flaky {
            failures: 10,
            confidence: 80,
            calls: AtomicU32::new(0),
        };
        let err = analyze_with_retry(&reasoner, &data(), policy(2))
            .await
            .unwrap_err();
        assert_eq!(reasoner.calls.load(Ordering::SeqCst), 2);
        let rendered = format!("{err:#}");
        assert!(rendered.contains("after 2 attempts"), "{rendered}");
        assert!(rendered.contains("upstream 503"), "{rendered}");
    }

    #[tokio::test]
    async fn invalid_records_are_retried() {
        let reasoner = Flaky {
            failures: 0,
            confidence: 150,
            calls: AtomicU32::new(0),
        };
        assert!(analyze_with_retry(&reasoner, &data(), policy(2)).await.is_err());
        assert_eq!(reasoner.calls.load(Ordering::SeqCst), 2);
    }
}
