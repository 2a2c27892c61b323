use std::fmt::Write as _;
use triage_evidence::{truncate_with_marker, TRUNCATION_MARKER};
use triage_protocol::VerdictRecord;

use crate::triage::TriageReport;

const SLACK_EXCERPT_LINES: usize = 12;
/// "```\n" before the excerpt plus "\n```" after it.
const FENCE_CHARS: usize = 8;

/// Chat-friendly summary (Slack mrkdwn), capped at `max_chars` characters.
pub fn render_slack_summary(
    report: &TriageReport,
    verdict: Option<&VerdictRecord>,
    max_chars: usize,
) -> String {
    let data = &report.error_data;
    let summary = &data.summary;
    let mut out = String::new();

    let run = match &report.repository {
        Some(repo) => format!("{repo} run {}", report.run_id),
        None => format!("run {}", report.run_id),
    };
    let _ = writeln!(out, "*CI triage* for {run}");

    if report.no_evidence {
        let _ = writeln!(
            out,
            "No artifacts, job logs or error message were available for this run."
        );
        return truncate_with_marker(out.trim_end(), max_chars);
    }

    match verdict {
        Some(v) => {
            let _ = writeln!(out, "*Verdict:* {} ({}% confidence)", v.verdict, v.confidence);
        }
        None => {
            let _ = writeln!(out, "*Verdict:* pending");
        }
    }
    match (&data.test_name, &data.file_name) {
        (Some(test), Some(file)) => {
            let _ = writeln!(out, "*Test:* {test} (`{file}`)");
        }
        (Some(test), None) => {
            let _ = writeln!(out, "*Test:* {test}");
        }
        (None, Some(file)) => {
            let _ = writeln!(out, "*Spec:* `{file}`");
        }
        (None, None) => {}
    }
    let _ = writeln!(
        out,
        "*Error type:* {} | *Category:* {}",
        summary.error_type, summary.test_issue_category
    );
    if let Some(selector) = &summary.selector {
        let _ = writeln!(out, "*Selector:* `{selector}`");
    }
    if !summary.evidence.is_empty() {
        let _ = writeln!(out, "*Evidence:*");
        for bullet in &summary.evidence {
            let _ = writeln!(out, "• {bullet}");
        }
    }
    if !data.screenshots.is_empty() {
        let _ = writeln!(out, "*Screenshots:* {}", data.screenshots.len());
    }
    if let Some(v) = verdict {
        let _ = writeln!(out, "*Reasoning:* {}", v.reasoning.trim());
    }

    let excerpt_source = if data.message.trim().is_empty() {
        summary.log_excerpt.as_str()
    } else {
        data.message.as_str()
    };
    let excerpt: Vec<&str> = excerpt_source
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SLACK_EXCERPT_LINES)
        .collect();
    if excerpt.is_empty() {
        return truncate_with_marker(out.trim_end(), max_chars);
    }

    // Only the excerpt body is cut, so the code block always closes.
    let body = excerpt.join("\n").replace("```", "'''");
    let body_budget = max_chars.saturating_sub(out.chars().count() + FENCE_CHARS);
    if body_budget > TRUNCATION_MARKER.chars().count() {
        let body = truncate_with_marker(&body, body_budget);
        let _ = write!(out, "```\n{body}\n```");
        return out;
    }
    // No room for a fenced excerpt: fall back to plain text under the overall cap.
    truncate_with_marker(&format!("{out}{body}"), max_chars)
}

/// Markdown for a pull request comment or issue body.
pub fn render_review_comment(report: &TriageReport, verdict: &VerdictRecord) -> String {
    let data = &report.error_data;
    let summary = &data.summary;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "## CI triage: {} ({}% confidence)\n",
        verdict.verdict, verdict.confidence
    );

    let mut facts = vec![format!("**Run:** {}", report.run_id)];
    if let Some(test) = &data.test_name {
        facts.push(format!("**Test:** {test}"));
    }
    if let Some(file) = &data.file_name {
        facts.push(format!("**Spec:** `{file}`"));
    }
    facts.push(format!(
        "**Error:** `{}` / `{}`",
        summary.error_type, summary.test_issue_category
    ));
    if let Some(selector) = &summary.selector {
        facts.push(format!("**Selector:** `{selector}`"));
    }
    let _ = writeln!(out, "{}\n", facts.join(" · "));

    let _ = writeln!(out, "### Reasoning\n\n{}\n", verdict.reasoning.trim());
    if let Some(root_cause) = &verdict.root_cause {
        let _ = writeln!(out, "### Root cause\n\n{}\n", root_cause.trim());
    }

    if !verdict.changes.is_empty() {
        let _ = writeln!(out, "### Suggested changes\n");
        for change in &verdict.changes {
            match change.line {
                Some(line) => {
                    let _ = writeln!(out, "#### `{}:{line}`\n", change.file);
                }
                None => {
                    let _ = writeln!(out, "#### `{}`\n", change.file);
                }
            }
            let _ = writeln!(out, "{}\n", change.description.trim());
            if change.before.is_some() || change.after.is_some() {
                let _ = writeln!(out, "```diff");
                for line in change.before.iter().flat_map(|b| b.lines()) {
                    let _ = writeln!(out, "- {line}");
                }
                for line in change.after.iter().flat_map(|a| a.lines()) {
                    let _ = writeln!(out, "+ {line}");
                }
                let _ = writeln!(out, "```\n");
            }
        }
    }

    if !summary.evidence.is_empty() {
        let _ = writeln!(out, "### Evidence\n");
        for bullet in &summary.evidence {
            let _ = writeln!(out, "- {bullet}");
        }
        out.push('\n');
    }

    if !summary.log_excerpt.is_empty() {
        let _ = writeln!(
            out,
            "<details><summary>Log excerpt</summary>\n\n```\n{}\n```\n\n</details>",
            summary.log_excerpt.replace("```", "'''")
        );
    }

    out.trim_end().to_string() + "\n"
}
