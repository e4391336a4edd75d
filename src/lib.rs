//! # bandmark
//!
//! Band scoring for IELTS-style Writing Task 1 and Task 2 essays, plus a
//! tutoring session over learning material, both backed by an
//! OpenAI-compatible chat completions API.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Maps annotations onto non-overlapping spans of the essay text
pub mod annotate;
/// Task kinds, word-count rules and the assessment result model
pub mod assessment;
/// Transport abstraction for chat completions and its error taxonomy
pub mod backend;
/// Built-in practice tasks
pub mod catalog;
/// Environment-driven runtime configuration
pub mod config;
/// A module defining a bunch of constant values to be used throughout
pub mod constants;
/// Essay grading, live and offline
pub mod grading;
/// Terminal presentation of assessments
pub mod render;
/// Persistence for assessments and tutoring transcripts
pub mod store;
/// Stateful tutoring sessions with retry and rollback
pub mod tutor;
