//! Small derivations over collected log lines: timestamps, the headline error, test and file names.

use once_cell::sync::Lazy;
use regex::Regex;
use triage_evidence::is_error_line;

static JOB_LOG_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?Z ?")
        .expect("timestamp pattern must compile")
});

static STRONG_ERROR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z]*Error:|\bTimed out\b|AssertionError")
        .expect("strong error pattern must compile")
});

static SPEC_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[\w./-]*?([\w-]+(?:\.[\w-]+)*\.(?:cy|spec|test)\.(?:[jt]sx?|mjs|cjs))\b")
        .expect("spec file pattern must compile")
});

static ARTIFACT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(?:cy|cypress)(?:-(?:logs|artifacts|screenshots|videos))?|screenshots?)[-_]")
        .expect("artifact prefix pattern must compile")
});

static MOCHA_FAILURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\d+\)\s+(\S.*?)\s*:?\s*$").expect("mocha heading pattern must compile")
});

/// Drop the `2024-05-01T10:00:00.1234567Z ` prefix GitHub puts on every job log line.
pub fn strip_timestamp(line: &str) -> &str {
    match JOB_LOG_TIMESTAMP.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

/// The line most likely to be the failure message: the first one with an explicit error
/// signature, else the first line that triggers context extraction.
pub fn pick_error_message<S: AsRef<str>>(lines: &[S]) -> Option<String> {
    let strong = lines
        .iter()
        .map(|line| line.as_ref())
        .find(|line| STRONG_ERROR.is_match(line));
    strong
        .or_else(|| lines.iter().map(|line| line.as_ref()).find(|line| is_error_line(line)))
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
}

/// First spec-file name (`login.cy.ts`, `cart.spec.js`, ...) in any candidate, directories
/// dropped. Artifact-name prefixes like `cy-logs-` are ignored.
pub fn derive_file_name<'a>(candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    candidates.into_iter().find_map(|candidate| {
        let stripped = ARTIFACT_PREFIX.replace(candidate.trim(), "");
        SPEC_FILE
            .captures(&stripped)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// Title of the first mocha-style failure heading (`  1) Login > submits the form`).
pub fn derive_test_name<S: AsRef<str>>(lines: &[S]) -> Option<String> {
    lines.iter().find_map(|line| {
        MOCHA_FAILURE
            .captures(line.as_ref())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn timestamps_are_stripped() {
        assert_eq!(
            strip_timestamp("2024-05-01T10:00:00.1234567Z Error: boom"),
            "Error: boom"
        );
        assert_eq!(strip_timestamp("2024-05-01T10:00:00Z ok"), "ok");
        assert_eq!(strip_timestamp("no timestamp here"), "no timestamp here");
    }

    #[test]
    fn strong_signatures_beat_earlier_triggers() {
        let lines = vec![
            "  Running: login.cy.ts",
            "  expected 3 retries",
            "CypressError: cy.click() failed because this element is detached",
            "Error: later",
        ];
        assert_eq!(
            pick_error_message(&lines).as_deref(),
            Some("CypressError: cy.click() failed because this element is detached")
        );
    }

    #[test]
    fn falls_back_to_first_trigger_line() {
        let lines = vec!["setup", "  ✖ 1 of 4 failed (25%)  ", "done"];
        assert_eq!(
            pick_error_message(&lines).as_deref(),
            Some("✖ 1 of 4 failed (25%)")
        );
        assert_eq!(pick_error_message(&["all good"]), None);
    }

    #[test]
    fn lowercase_error_words_are_not_strong() {
        let lines = vec!["--- error.txt ---", "Timed out retrying after 4000ms"];
        assert_eq!(
            pick_error_message(&lines).as_deref(),
            Some("Timed out retrying after 4000ms")
        );
    }

    #[test]
    fn spec_files_from_hints_and_artifacts() {
        assert_eq!(
            derive_file_name(["checkout.cy.ts"]).as_deref(),
            Some("checkout.cy.ts")
        );
        assert_eq!(
            derive_file_name(["cy-logs-login.cy.ts-12345"]).as_deref(),
            Some("login.cy.ts")
        );
        assert_eq!(
            derive_file_name(["coverage", "Running:  cypress/e2e/user-profile.spec.js  (1 of 3)"])
                .as_deref(),
            Some("user-profile.spec.js")
        );
        assert_eq!(derive_file_name(["cypress-screenshots", "notes.txt"]), None);
    }

    #[test]
    fn first_mocha_failure_heading_names_the_test() {
        let lines = vec![
            "  Login",
            "    ✓ renders (120ms)",
            "    1) Login > submits the form",
            "  2) Cart > totals:",
        ];
        assert_eq!(
            derive_test_name(&lines).as_deref(),
            Some("Login > submits the form")
        );
        assert_eq!(derive_test_name(&["no headings"]), None);
    }
}
