use serde::{Deserialize, Serialize};
use triage_classifier::Classification;
use triage_protocol::{
    enforce_max_chars, BudgetTruncation, Screenshot, ScreenshotRef, StructuredErrorSummary,
};

use crate::truncate::{is_truncated, retruncate, truncate_with_marker};

const DEFAULT_MAX_SUMMARY_CHARS: usize = 30_000;
const DEFAULT_MAX_EXCERPT_CHARS: usize = 12_000;
const DEFAULT_MAX_SCREENSHOTS: usize = 5;
/// The excerpt is halved down to this floor before anything else is dropped.
const MIN_EXCERPT_CHARS: usize = 200;
const MAX_SELECTOR_CHARS: usize = 256;

/// Size limits for one [`StructuredErrorSummary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceBudget {
    /// Hard cap on the serialized summary (JSON characters).
    pub max_summary_chars: usize,
    /// Cap on the log excerpt before the summary-level cap is applied.
    pub max_excerpt_chars: usize,
    pub max_screenshots: usize,
}

impl Default for EvidenceBudget {
    fn default() -> Self {
        Self {
            max_summary_chars: DEFAULT_MAX_SUMMARY_CHARS,
            max_excerpt_chars: DEFAULT_MAX_EXCERPT_CHARS,
            max_screenshots: DEFAULT_MAX_SCREENSHOTS,
        }
    }
}

impl EvidenceBudget {
    /// Smallest summary cap that always leaves room for the fixed fields.
    pub const MIN_SUMMARY_CHARS: usize = 1_000;

    pub fn validate(&self) -> Result<(), String> {
        if self.max_summary_chars < Self::MIN_SUMMARY_CHARS {
            return Err(format!(
                "max_summary_chars ({}) must be at least {}",
                self.max_summary_chars,
                Self::MIN_SUMMARY_CHARS
            ));
        }
        if self.max_excerpt_chars < MIN_EXCERPT_CHARS {
            return Err(format!(
                "max_excerpt_chars ({}) must be at least {MIN_EXCERPT_CHARS}",
                self.max_excerpt_chars
            ));
        }
        if self.max_excerpt_chars > self.max_summary_chars {
            return Err(format!(
                "max_excerpt_chars ({}) cannot exceed max_summary_chars ({})",
                self.max_excerpt_chars, self.max_summary_chars
            ));
        }
        Ok(())
    }
}

/// Combine classification, log context and screenshot references into one bounded summary.
///
/// When `log_lines` is empty the raw error message stands in as the excerpt.
pub fn assemble(
    raw_message: &str,
    screenshots: &[Screenshot],
    log_lines: &[String],
    classification: &Classification,
    budget: &EvidenceBudget,
) -> StructuredErrorSummary {
    let joined = if log_lines.is_empty() {
        raw_message.trim().to_string()
    } else {
        log_lines.join("\n")
    };
    let log_excerpt = truncate_with_marker(&joined, budget.max_excerpt_chars);

    let mut truncation = is_truncated(&log_excerpt).then_some(BudgetTruncation::MaxChars);
    let refs: Vec<ScreenshotRef> = screenshots
        .iter()
        .take(budget.max_screenshots)
        .map(Screenshot::to_ref)
        .collect();
    if refs.len() < screenshots.len() {
        truncation.get_or_insert(BudgetTruncation::MaxItems);
    }

    let selector = classification
        .selector
        .as_deref()
        .map(|s| s.chars().take(MAX_SELECTOR_CHARS).collect::<String>());

    let mut summary = StructuredErrorSummary {
        error_type: classification.error_type,
        test_issue_category: classification.category,
        selector,
        evidence: classification.evidence.clone(),
        log_excerpt,
        screenshots: refs,
        truncated: truncation.is_some(),
        truncation,
        used_chars: 0,
    };

    let enforced = enforce_max_chars(
        &mut summary,
        budget.max_summary_chars,
        |s, used| s.used_chars = used,
        |s| {
            s.truncated = true;
            s.truncation = Some(BudgetTruncation::MaxChars);
        },
        shrink_summary,
    );
    if let Err(err) = enforced {
        log::warn!("Evidence summary exceeds its budget after shrinking: {err}");
    }

    summary
}

/// Drop one step of detail. Order: halve the excerpt (down to a floor), then screenshots, then
/// evidence bullets, then the excerpt itself.
fn shrink_summary(summary: &mut StructuredErrorSummary) -> bool {
    let excerpt_chars = summary.log_excerpt.chars().count();
    if excerpt_chars > MIN_EXCERPT_CHARS {
        let target = (excerpt_chars / 2).max(MIN_EXCERPT_CHARS);
        summary.log_excerpt = retruncate(&summary.log_excerpt, target);
        return true;
    }
    if summary.screenshots.pop().is_some() {
        return true;
    }
    if summary.evidence.pop().is_some() {
        return true;
    }
    if !summary.log_excerpt.is_empty() {
        summary.log_excerpt.clear();
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::truncate::TRUNCATION_MARKER;
    use pretty_assertions::assert_eq;
    use triage_classifier::classify;
    use triage_protocol::{ErrorType, TestIssueCategory};

    fn shot(i: usize) -> Screenshot {
        Screenshot {
            name: format!("shot-{i}.png"),
            path: format!("cypress/screenshots/shot-{i}.png"),
            base64: "iVBORw0KGgo=".to_string(),
            timestamp: None,
        }
    }

    #[test]
    fn small_inputs_pass_through() {
        let message = r#"Timed out retrying after 4000ms: expected to find element [data-testid="login-button"]"#;
        let classification = classify(message);
        let lines = vec!["Running login.cy.ts".to_string(), message.to_string()];
        let summary = assemble(
            message,
            &[shot(0)],
            &lines,
            &classification,
            &EvidenceBudget::default(),
        );

        assert_eq!(summary.error_type, ErrorType::Timeout);
        assert_eq!(summary.test_issue_category, TestIssueCategory::Timeout);
        assert_eq!(
            summary.selector.as_deref(),
            Some(r#"[data-testid="login-button"]"#)
        );
        assert_eq!(summary.log_excerpt, lines.join("\n"));
        assert_eq!(summary.screenshots.len(), 1);
        assert!(!summary.truncated);
        assert_eq!(
            summary.used_chars,
            serde_json::to_string(&summary).unwrap().chars().count()
        );
    }

    #[test]
    fn raw_message_is_the_excerpt_without_logs() {
        let summary = assemble(
            "  Error: boom  ",
            &[],
            &[],
            &Classification::unknown(),
            &EvidenceBudget::default(),
        );
        assert_eq!(summary.log_excerpt, "Error: boom");
    }

    #[test]
    fn oversized_evidence_is_cut_to_budget() {
        let lines: Vec<String> = (0..5_000)
            .map(|i| format!("Error: failure number {i} in spec"))
            .collect();
        let budget = EvidenceBudget {
            max_summary_chars: 2_000,
            max_excerpt_chars: 2_000,
            max_screenshots: 3,
        };
        let shots: Vec<Screenshot> = (0..8).map(shot).collect();
        let summary = assemble(
            "Error: failure number 0 in spec",
            &shots,
            &lines,
            &classify("Error: failure number 0 in spec"),
            &budget,
        );

        let serialized = serde_json::to_string(&summary).unwrap();
        assert!(serialized.chars().count() <= 2_000);
        assert!(summary.truncated);
        assert_eq!(summary.truncation, Some(BudgetTruncation::MaxChars));
        assert!(summary.screenshots.len() <= 3);
        assert!(summary.log_excerpt.ends_with(TRUNCATION_MARKER));
        let kept = &summary.log_excerpt[..summary.log_excerpt.len() - TRUNCATION_MARKER.len()];
        assert!(lines.join("\n").starts_with(kept));
    }

    #[test]
    fn screenshot_refs_are_capped() {
        let shots: Vec<Screenshot> = (0..8).map(shot).collect();
        let summary = assemble(
            "Error: x",
            &shots,
            &[],
            &Classification::unknown(),
            &EvidenceBudget::default(),
        );
        assert_eq!(summary.screenshots.len(), DEFAULT_MAX_SCREENSHOTS);
        assert_eq!(summary.truncation, Some(BudgetTruncation::MaxItems));
    }

    #[test]
    fn budget_validation() {
        assert!(EvidenceBudget::default().validate().is_ok());
        let tiny = EvidenceBudget {
            max_summary_chars: 10,
            ..EvidenceBudget::default()
        };
        assert!(tiny.validate().is_err());
        let inverted = EvidenceBudget {
            max_summary_chars: 2_000,
            max_excerpt_chars: 4_000,
            max_screenshots: 1,
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn excerpt_cap_must_leave_room_for_the_marker() {
        let budget = EvidenceBudget {
            max_excerpt_chars: TRUNCATION_MARKER.chars().count() - 1,
            ..EvidenceBudget::default()
        };
        let err = budget.validate().unwrap_err();
        assert!(err.contains("max_excerpt_chars"), "{err}");

        let smallest = EvidenceBudget {
            max_excerpt_chars: MIN_EXCERPT_CHARS,
            ..EvidenceBudget::default()
        };
        assert!(smallest.validate().is_ok());
        assert!(MIN_EXCERPT_CHARS > TRUNCATION_MARKER.chars().count());

        let long = "word ".repeat(400);
        let excerpt = truncate_with_marker(&long, smallest.max_excerpt_chars);
        assert!(excerpt.ends_with(TRUNCATION_MARKER));
        assert!(excerpt.chars().count() <= MIN_EXCERPT_CHARS);
    }
}
