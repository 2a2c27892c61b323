//! # Triage Evidence
//!
//! Narrows raw, line-oriented CI logs down to bounded evidence:
//!
//! ```text
//! log text ──> extract_context (±N lines around error lines, deduplicated)
//!          ──> classify (triage-classifier)
//!          ──> assemble (size-capped StructuredErrorSummary)
//! ```
//!
//! All truncation goes through [`truncate_with_marker`], which keeps a prefix of the input and
//! always ends with [`TRUNCATION_MARKER`].

mod assembler;
mod log_context;
mod truncate;

pub use assembler::{assemble, EvidenceBudget};
pub use log_context::{
    extract_context, extract_context_from_text, is_error_line, DEFAULT_CONTEXT_WINDOW,
};
pub use truncate::{
    is_truncated, retruncate, truncate_with_marker, BOUNDARY_MIN_RATIO, TRUNCATION_MARKER,
    WORD_MIN_RATIO,
};
