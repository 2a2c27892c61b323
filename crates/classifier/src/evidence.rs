use once_cell::sync::Lazy;
use regex::Regex;

pub const VISIBILITY_NOTE: &str =
    "Element visibility issue: the element may be hidden, covered, or detached when the command runs";
pub const ASYNC_TIMING_NOTE: &str =
    "Possible async timing issue: the element or data may not be ready when the command runs";

static SELECTOR_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\[[^\]\s][^\]]*\]|(?:^|[\s'"`(])([#.][a-zA-Z_][\w-]*)"#)
        .expect("selector token pattern must compile")
});
static DURATION_MS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d+)\s?ms\b").expect("duration pattern must compile"));
static VISIBILITY_LOSS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)not visible|invisible|hidden|covered|display:\s*none|visibility|detached|obscured")
        .expect("visibility pattern must compile")
});
static ASYNC_TIMING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)retrying|waiting for|still loading|not yet|async|race condition|eventually")
        .expect("async timing pattern must compile")
});

/// Short evidence bullets for a failure message. Every matching check contributes one bullet.
#[must_use]
pub fn extract_test_issue_evidence(message: &str) -> Vec<String> {
    let mut evidence = Vec::new();

    if let Some(caps) = SELECTOR_TOKEN.captures(message) {
        let token = caps.get(1).or_else(|| caps.get(0)).map(|m| m.as_str().trim());
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            evidence.push(format!("Selector involved: {token}"));
        }
    }

    if let Some(caps) = DURATION_MS.captures(message) {
        if let Some(ms) = caps.get(1) {
            evidence.push(format!("Timeout: {}ms", ms.as_str()));
        }
    }

    if VISIBILITY_LOSS.is_match(message) {
        evidence.push(VISIBILITY_NOTE.to_string());
    }

    if ASYNC_TIMING.is_match(message) {
        evidence.push(ASYNC_TIMING_NOTE.to_string());
    }

    evidence
}
