//! Parsing and correlation engine for BMAD project artifacts.
//!
//! Turns the loosely-structured markdown and YAML files of a BMAD
//! repository (epics document, per-story files, sprint-status document)
//! into one consistent project snapshot. Parsing is pure and failure
//! tolerant: one malformed file never aborts the rest of the project.

pub mod artifact;
pub mod classify;
pub mod config;
pub mod correlate;
pub mod epics;
pub mod project;
pub mod source;
pub mod sprint;
pub mod status;
pub mod story;
pub mod tree;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
