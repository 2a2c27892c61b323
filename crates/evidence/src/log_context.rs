use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

pub const DEFAULT_CONTEXT_WINDOW: usize = 10;

static ERROR_TRIGGER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)error:|failed:|failure:|exception:|assertion|expected|timeout|cypress error|[✖×✗]|\bfail\b",
    )
    .expect("error trigger pattern must compile")
});

/// Does this log line carry an error signal?
pub fn is_error_line(line: &str) -> bool {
    ERROR_TRIGGER.is_match(line)
}

/// Keep `window` lines on each side of every error line.
///
/// Windows are clamped to the input, blank lines are dropped, and each distinct line is emitted
/// once at the position it was first seen.
pub fn extract_context<S: AsRef<str>>(lines: &[S], window: usize) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    // Lines before this index have already been walked by an earlier window.
    let mut next_unvisited = 0usize;

    for (idx, line) in lines.iter().enumerate() {
        if !is_error_line(line.as_ref()) {
            continue;
        }

        let start = idx.saturating_sub(window).max(next_unvisited);
        let end = idx.saturating_add(window).min(lines.len().saturating_sub(1));
        if start > end {
            continue;
        }
        for candidate in &lines[start..=end] {
            let candidate = candidate.as_ref();
            if candidate.trim().is_empty() {
                continue;
            }
            if seen.insert(candidate) {
                out.push(candidate.to_string());
            }
        }
        next_unvisited = end + 1;
    }

    out
}

/// Split raw log text into lines and extract context.
pub fn extract_context_from_text(text: &str, window: usize) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    extract_context(&lines, window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn numbered(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("line {i}")).collect()
    }

    #[test]
    fn window_is_clamped_to_bounds() {
        let mut lines = numbered(6);
        lines[1] = "Error: boom".to_string();
        let out = extract_context(&lines, 2);
        assert_eq!(out, vec!["line 0", "Error: boom", "line 2", "line 3"]);
    }

    #[test]
    fn overlapping_windows_emit_each_line_once() {
        let mut lines = numbered(12);
        lines[3] = "AssertionError: expected 1 to equal 2".to_string();
        lines[5] = "  ✖ 1 of 3 failed".to_string();
        let out = extract_context(&lines, 2);
        assert_eq!(
            out,
            vec![
                "line 1",
                "line 2",
                "AssertionError: expected 1 to equal 2",
                "line 4",
                "  ✖ 1 of 3 failed",
                "line 6",
                "line 7",
            ]
        );
    }

    #[test]
    fn blank_and_duplicate_lines_are_dropped() {
        let lines = vec!["retry", "", "   ", "Error: a", "retry", "Error: a", "tail"];
        let out = extract_context(&lines, 1);
        assert_eq!(out, vec!["Error: a", "retry", "tail"]);
    }

    #[test]
    fn trigger_keywords() {
        for line in [
            "TypeError: x is undefined",
            "Tests failed: 2",
            "Failure: login",
            "Exception: nope",
            "assertion mismatch",
            "Expected 200",
            "TIMEOUT after 30s",
            "CypressError: cy.visit()",
            "× broken",
            "✗ broken",
            "test fail here",
        ] {
            assert!(is_error_line(line), "{line}");
        }
        for line in ["all good", "failed", "failing tests", "Errors are fine"] {
            assert!(!is_error_line(line), "{line}");
        }
    }

    #[test]
    fn repeated_extraction_is_stable() {
        let mut lines = numbered(40);
        lines[5] = "Error: first".to_string();
        lines[30] = "Timed out retrying after 4000ms: expected button".to_string();
        let once = extract_context(&lines, 3);
        let again = extract_context(&lines, 3);
        assert_eq!(once, again);
        let twice = extract_context(&once, 3);
        assert_eq!(twice, once);
    }

    #[test]
    fn no_error_lines_means_no_context() {
        assert!(extract_context(&numbered(5), 10).is_empty());
        assert!(extract_context_from_text("", 10).is_empty());
    }
}
