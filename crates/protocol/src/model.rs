use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::BudgetTruncation;

/// An artifact attached to a CI run, as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ArtifactDescriptor {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub size_in_bytes: u64,
}

/// A job within a CI run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JobDescriptor {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,
}

impl JobDescriptor {
    pub fn failed(&self) -> bool {
        matches!(
            self.conclusion.as_deref(),
            Some("failure" | "timed_out" | "cancelled")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Screenshot {
    /// File name without directories.
    pub name: String,
    /// Path inside the artifact archive.
    pub path: String,
    /// Base64 (standard alphabet) image bytes.
    pub base64: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Screenshot {
    pub fn to_ref(&self) -> ScreenshotRef {
        ScreenshotRef {
            name: self.name.clone(),
            path: self.path.clone(),
        }
    }
}

/// Screenshot reference without payload, used inside size-bounded summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScreenshotRef {
    pub name: String,
    pub path: String,
}

/// Root-cause label for a failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    ElementNotFound,
    ElementNotVisible,
    ElementCovered,
    ElementDetached,
    InvalidElementType,
    Timeout,
    AssertionFailed,
    NetworkError,
    Unknown,
}

impl ErrorType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ElementNotFound => "ELEMENT_NOT_FOUND",
            Self::ElementNotVisible => "ELEMENT_NOT_VISIBLE",
            Self::ElementCovered => "ELEMENT_COVERED",
            Self::ElementDetached => "ELEMENT_DETACHED",
            Self::InvalidElementType => "INVALID_ELEMENT_TYPE",
            Self::Timeout => "TIMEOUT",
            Self::AssertionFailed => "ASSERTION_FAILED",
            Self::NetworkError => "NETWORK_ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::ElementNotFound => "Element not found",
            Self::ElementNotVisible => "Element not visible",
            Self::ElementCovered => "Element covered by another element",
            Self::ElementDetached => "Element detached from the DOM",
            Self::InvalidElementType => "Command used on an invalid element type",
            Self::Timeout => "Timed out",
            Self::AssertionFailed => "Assertion failed",
            Self::NetworkError => "Network error",
            Self::Unknown => "Unknown error",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fix-routing category for a failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestIssueCategory {
    ElementNotFound,
    Timeout,
    Visibility,
    Assertion,
    Network,
    Unknown,
}

impl TestIssueCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ElementNotFound => "ELEMENT_NOT_FOUND",
            Self::Timeout => "TIMEOUT",
            Self::Visibility => "VISIBILITY",
            Self::Assertion => "ASSERTION",
            Self::Network => "NETWORK",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TestIssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounded, structured evidence derived from one failure.
///
/// The serialized size is kept under the configured cap by the assembler; `truncated` and
/// `truncation` record whether anything was dropped to get there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StructuredErrorSummary {
    pub error_type: ErrorType,
    pub test_issue_category: TestIssueCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub log_excerpt: String,
    #[serde(default)]
    pub screenshots: Vec<ScreenshotRef>,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncation: Option<BudgetTruncation>,
    #[serde(default)]
    pub used_chars: usize,
}

impl StructuredErrorSummary {
    /// Summary for a run that produced no usable evidence at all.
    pub fn empty() -> Self {
        Self {
            error_type: ErrorType::Unknown,
            test_issue_category: TestIssueCategory::Unknown,
            selector: None,
            evidence: Vec::new(),
            log_excerpt: String::new(),
            screenshots: Vec::new(),
            truncated: false,
            truncation: None,
            used_chars: 0,
        }
    }
}

/// Everything the reasoning step receives for one triage invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorData {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default)]
    pub screenshots: Vec<Screenshot>,
    pub summary: StructuredErrorSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_serialize_as_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&ErrorType::ElementNotVisible).unwrap(),
            "\"ELEMENT_NOT_VISIBLE\""
        );
        assert_eq!(
            serde_json::to_string(&TestIssueCategory::Visibility).unwrap(),
            "\"VISIBILITY\""
        );
        assert_eq!(ErrorType::InvalidElementType.to_string(), "INVALID_ELEMENT_TYPE");
    }

    #[test]
    fn job_failed_tracks_conclusion() {
        let mut job = JobDescriptor {
            id: 1,
            name: "e2e (login.cy.ts)".to_string(),
            status: Some("completed".to_string()),
            conclusion: Some("success".to_string()),
        };
        assert!(!job.failed());
        job.conclusion = Some("failure".to_string());
        assert!(job.failed());
        job.conclusion = None;
        assert!(!job.failed());
    }

    #[test]
    fn empty_summary_is_unknown() {
        let summary = StructuredErrorSummary::empty();
        assert_eq!(summary.error_type, ErrorType::Unknown);
        assert_eq!(summary.test_issue_category, TestIssueCategory::Unknown);
        assert!(summary.evidence.is_empty());
    }
}
