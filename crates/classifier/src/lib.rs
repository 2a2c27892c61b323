//! # Triage Classifier
//!
//! Deterministic, rule-based reading of a single failure message:
//!
//! - [`classify_error_type`]: root-cause label ([`ErrorType`])
//! - [`categorize_test_issue`]: fix-routing category ([`TestIssueCategory`])
//! - [`extract_selector`]: most useful DOM/CSS selector, via an ordered matcher cascade
//! - [`extract_test_issue_evidence`]: short evidence bullets
//!
//! The two taxonomies are independent ordered rule lists over the same text and may disagree.
//!
//! ```rust
//! use triage_classifier::{classify, ErrorType, TestIssueCategory};
//!
//! let c = classify("Timed out retrying after 4000ms: expected to find element [data-testid=\"go\"]");
//! assert_eq!(c.error_type, ErrorType::Timeout);
//! assert_eq!(c.category, TestIssueCategory::Timeout);
//! assert_eq!(c.selector.as_deref(), Some("[data-testid=\"go\"]"));
//! ```

mod error_type;
mod evidence;
mod selector;
mod test_issue;

use serde::Serialize;

pub use error_type::classify_error_type;
pub use evidence::{extract_test_issue_evidence, ASYNC_TIMING_NOTE, VISIBILITY_NOTE};
pub use selector::{extract_selector, PatternMatcher, SelectorCascade, SelectorMatcher};
pub use test_issue::categorize_test_issue;
pub use triage_protocol::{ErrorType, TestIssueCategory};

/// All classifier outputs for one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub error_type: ErrorType,
    pub category: TestIssueCategory,
    pub selector: Option<String>,
    pub evidence: Vec<String>,
}

impl Classification {
    pub fn unknown() -> Self {
        Self {
            error_type: ErrorType::Unknown,
            category: TestIssueCategory::Unknown,
            selector: None,
            evidence: Vec::new(),
        }
    }
}

#[must_use]
pub fn classify(message: &str) -> Classification {
    if message.trim().is_empty() {
        return Classification::unknown();
    }
    Classification {
        error_type: classify_error_type(message),
        category: categorize_test_issue(message),
        selector: extract_selector(message),
        evidence: extract_test_issue_evidence(message),
    }
}
