use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use crate::error::TriageError;

static RUN_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://[^/\s]+/([^/\s]+)/([^/\s]+)/actions/runs/(\d+)(?:[/?#]\S*)?$")
        .expect("run url pattern must compile")
});

/// A workflow run, given either as a bare run id or as a run URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRef {
    pub run_id: u64,
    /// `owner/repo`, when the run was given as a URL.
    pub repository: Option<String>,
}

impl FromStr for RunRef {
    type Err = TriageError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TriageError::invalid_run_id(input, "empty"));
        }

        if trimmed.bytes().all(|b| b.is_ascii_digit()) {
            let run_id = parse_id(input, trimmed)?;
            return Ok(Self {
                run_id,
                repository: None,
            });
        }

        let caps = RUN_URL.captures(trimmed).ok_or_else(|| {
            TriageError::invalid_run_id(
                input,
                "expected a run number or https://<host>/<owner>/<repo>/actions/runs/<id>",
            )
        })?;
        Ok(Self {
            run_id: parse_id(input, &caps[3])?,
            repository: Some(format!("{}/{}", &caps[1], &caps[2])),
        })
    }
}

fn parse_id(input: &str, digits: &str) -> Result<u64, TriageError> {
    match digits.parse::<u64>() {
        Ok(0) => Err(TriageError::invalid_run_id(input, "run id must be positive")),
        Ok(id) => Ok(id),
        Err(err) => Err(TriageError::invalid_run_id(input, err.to_string())),
    }
}

impl fmt::Display for RunRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repository {
            Some(repo) => write!(f, "{repo}#{}", self.run_id),
            None => write!(f, "{}", self.run_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bare_numbers() {
        let run: RunRef = " 9876543210 ".parse().unwrap();
        assert_eq!(run.run_id, 9_876_543_210);
        assert_eq!(run.repository, None);
        assert_eq!(run.to_string(), "9876543210");
    }

    #[test]
    fn run_urls_carry_the_repository() {
        for url in [
            "https://github.com/acme/shop/actions/runs/123",
            "https://github.com/acme/shop/actions/runs/123/",
            "https://github.com/acme/shop/actions/runs/123/job/456",
            "https://github.com/acme/shop/actions/runs/123/attempts/2?pr=7",
        ] {
            let run: RunRef = url.parse().unwrap();
            assert_eq!(run.run_id, 123, "{url}");
            assert_eq!(run.repository.as_deref(), Some("acme/shop"), "{url}");
        }
    }

    #[test]
    fn malformed_inputs_fail_fast() {
        for bad in [
            "",
            "0",
            "-5",
            "12abc",
            "99999999999999999999999",
            "https://github.com/acme/shop/pull/12",
            "https://github.com/acme/actions/runs/12",
        ] {
            assert!(
                matches!(bad.parse::<RunRef>(), Err(TriageError::InvalidRunId { .. })),
                "{bad}"
            );
        }
    }
}
