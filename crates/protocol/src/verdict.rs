use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    TestIssue,
    ProductIssue,
}

impl Verdict {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TestIssue => "TEST_ISSUE",
            Self::ProductIssue => "PRODUCT_ISSUE",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A suggested edit attached to a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Change {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

/// What the reasoning step returns for one [`crate::ErrorData`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerdictRecord {
    pub verdict: Verdict,
    /// 0-100
    pub confidence: u8,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
    #[serde(default)]
    pub changes: Vec<Change>,
}

impl VerdictRecord {
    pub fn validate(&self) -> Result<()> {
        if self.confidence > 100 {
            anyhow::bail!("confidence must be within 0..=100 (got {})", self.confidence);
        }
        if self.reasoning.trim().is_empty() {
            anyhow::bail!("reasoning must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reasoning_collaborator_payload() {
        let raw = r#"{
            "verdict": "TEST_ISSUE",
            "confidence": 87,
            "reasoning": "Selector changed in the last deploy",
            "rootCause": "stale data-testid",
            "changes": [{"file": "cypress/e2e/login.cy.ts", "line": 12, "description": "update selector"}]
        }"#;
        let record: VerdictRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.verdict, Verdict::TestIssue);
        assert_eq!(record.root_cause.as_deref(), Some("stale data-testid"));
        assert_eq!(record.changes[0].line, Some(12));
        assert!(record.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_confidence() {
        let record = VerdictRecord {
            verdict: Verdict::ProductIssue,
            confidence: 140,
            reasoning: "api returned 500".to_string(),
            root_cause: None,
            changes: Vec::new(),
        };
        assert!(record.validate().is_err());
    }
}
