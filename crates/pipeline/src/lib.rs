//! # Triage Pipeline
//!
//! Runs evidence collection for one failed workflow run:
//!
//! ```text
//! locate ──> extract (concurrent, list order) ──> job logs ──> log context
//!        ──> classify ──> assemble ──> TriageReport { ErrorData, metadata }
//! ```
//!
//! The reasoning step that turns [`ErrorData`](triage_protocol::ErrorData) into a verdict sits
//! behind the [`Reasoner`] trait; [`render_slack_summary`] and [`render_review_comment`] format
//! the result for people.

mod config;
mod error;
mod reasoning;
mod render;
mod run_ref;
mod signals;
mod triage;

pub use config::{ReasoningConfig, TriageConfig};
pub use error::{Result, TriageError};
pub use reasoning::{analyze_with_retry, Reasoner, RetryPolicy};
pub use render::{render_review_comment, render_slack_summary};
pub use run_ref::RunRef;
pub use signals::{derive_file_name, derive_test_name, pick_error_message, strip_timestamp};
pub use triage::{ArtifactReport, Triage, TriageReport, TriageRequest};
