//! Workspace-wide helpers that carry no labeling semantics.

pub mod log_setup;
pub mod parallel;
