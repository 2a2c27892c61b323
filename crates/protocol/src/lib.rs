//! Shared data model for CI failure triage.
//!
//! Every crate in the workspace speaks these types: the artifact collaborator produces
//! [`ArtifactDescriptor`]s, the content extractor produces [`Screenshot`]s, the assembler produces
//! a [`StructuredErrorSummary`] and the pipeline hands one [`ErrorData`] to the reasoning step,
//! which answers with a [`VerdictRecord`].

use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod model;
pub mod verdict;

pub use model::{
    ArtifactDescriptor, ErrorData, ErrorType, JobDescriptor, Screenshot, ScreenshotRef,
    StructuredErrorSummary, TestIssueCategory,
};
pub use verdict::{Change, Verdict, VerdictRecord};

pub const EVIDENCE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTruncation {
    MaxChars,
    MaxItems,
}

/// Serialize `value` until the reported size converges.
///
/// `set_used` writes the current character count back into the value, which itself changes the
/// serialized size, so this iterates to a fixed point (bounded).
pub fn finalize_used_chars<T: Serialize>(
    value: &mut T,
    mut set_used: impl FnMut(&mut T, usize),
) -> Result<usize> {
    let mut used = 0usize;
    for _ in 0..8 {
        set_used(value, used);
        let raw = serde_json::to_string(value)?;
        let next = raw.chars().count();
        if next == used {
            set_used(value, next);
            return Ok(next);
        }
        used = next;
    }
    set_used(value, used);
    Ok(used)
}

/// Shrink `value` until its serialized form fits `max_chars`.
///
/// `shrink` returns `false` when nothing else can be dropped; that is reported as an error.
pub fn enforce_max_chars<T: Serialize>(
    value: &mut T,
    max_chars: usize,
    mut set_used: impl FnMut(&mut T, usize),
    mut on_truncate: impl FnMut(&mut T),
    mut shrink: impl FnMut(&mut T) -> bool,
) -> Result<usize> {
    loop {
        let used = finalize_used_chars(value, |inner, used| set_used(inner, used))?;
        if used <= max_chars {
            return Ok(used);
        }
        on_truncate(value);
        if !shrink(value) {
            anyhow::bail!("budget exceeded (used_chars={used}, max_chars={max_chars})");
        }
    }
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Bounded {
        items: Vec<String>,
        used_chars: usize,
        truncated: bool,
    }

    #[test]
    fn finalize_converges_on_self_referential_size() {
        let mut value = Bounded {
            items: vec!["alpha".to_string()],
            used_chars: 0,
            truncated: false,
        };
        let used = finalize_used_chars(&mut value, |v, used| v.used_chars = used).unwrap();
        assert_eq!(used, serde_json::to_string(&value).unwrap().chars().count());
        assert_eq!(value.used_chars, used);
    }

    #[test]
    fn enforce_drops_items_until_it_fits() {
        let mut value = Bounded {
            items: (0..50).map(|i| format!("item-{i:03}")).collect(),
            used_chars: 0,
            truncated: false,
        };
        let used = enforce_max_chars(
            &mut value,
            200,
            |v, used| v.used_chars = used,
            |v| v.truncated = true,
            |v| v.items.pop().is_some(),
        )
        .unwrap();
        assert!(used <= 200);
        assert!(value.truncated);
        assert!(!value.items.is_empty());
    }

    #[test]
    fn enforce_fails_when_nothing_left_to_shrink() {
        let mut value = Bounded {
            items: vec!["x".repeat(300)],
            used_chars: 0,
            truncated: false,
        };
        let err = enforce_max_chars(
            &mut value,
            100,
            |v, used| v.used_chars = used,
            |v| v.truncated = true,
            |_| false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("budget exceeded"));
    }
}
