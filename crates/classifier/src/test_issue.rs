use once_cell::sync::Lazy;
use regex::Regex;
use triage_protocol::TestIssueCategory;

/// Fix-routing rules, checked in order. Kept separate from the error-type phrase table: the two
/// taxonomies have different granularity and are allowed to disagree.
static TEST_ISSUE_RULES: Lazy<Vec<(TestIssueCategory, Regex)>> = Lazy::new(|| {
    [
        (
            TestIssueCategory::ElementNotFound,
            r"(?i)not found|could not find|unable to find|cannot find|never found|does not exist|no elements? (?:found|matched)",
        ),
        (TestIssueCategory::Timeout, r"(?i)timed?\s?out|timeout|exceeded"),
        (
            TestIssueCategory::Visibility,
            r"(?i)not visible|visibility|invisible|covered|hidden|display:\s*none|obscured",
        ),
        (
            TestIssueCategory::Assertion,
            r"(?i)assert|expected|to (?:equal|be|have|contain|include)\b",
        ),
        (
            TestIssueCategory::Network,
            r"(?i)network|fetch|\bapi\b|request|xhr|econnrefused|econnreset|socket hang up",
        ),
    ]
    .into_iter()
    .map(|(category, pattern)| {
        (
            category,
            Regex::new(pattern).expect("test issue rule must compile"),
        )
    })
    .collect()
});

/// Route a failure message to the category of fix it most likely needs.
#[must_use]
pub fn categorize_test_issue(message: &str) -> TestIssueCategory {
    if message.trim().is_empty() {
        return TestIssueCategory::Unknown;
    }

    TEST_ISSUE_RULES
        .iter()
        .find(|(_, rule)| rule.is_match(message))
        .map_or(TestIssueCategory::Unknown, |(category, _)| *category)
}
