use regex::Regex;

use crate::source::{TreeEntry, TreeEntryKind};

/// Root directory the BMAD convention writes into.
pub const BMAD_OUTPUT: &str = "_bmad-output";
/// Subdirectory holding planning documents (epics).
pub const PLANNING: &str = "planning-artifacts";
/// Subdirectory holding implementation documents (stories, sprint status).
pub const IMPLEMENTATION: &str = "implementation-artifacts";

/// Result of classifying a repository tree: which paths carry BMAD data.
///
/// Every selection is independent and optional; a repository missing any of
/// them still classifies cleanly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BmadLayout {
    pub sprint_status_path: Option<String>,
    pub epics_path: Option<String>,
    pub story_paths: Vec<String>,
    /// Every blob path under the BMAD output directory.
    pub bmad_paths: Vec<String>,
    /// Root-level docs folder, detected case-insensitively, original casing.
    pub docs_folder: Option<String>,
}

pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn is_story_filename(filename: &str) -> bool {
    let current = Regex::new(r"^\d+-\d+-.+\.md$").expect("regex");
    let legacy = Regex::new(r"(?i)^story[_-]?\d").expect("regex");
    current.is_match(filename) || legacy.is_match(filename)
}

/// Locate the sprint-status file, the epics file, and the story files among
/// an arbitrary repository layout. First match wins for the two singleton
/// documents; all matching story files are kept in tree order.
pub fn classify_tree(entries: &[TreeEntry]) -> BmadLayout {
    let bmad_prefix = format!("{BMAD_OUTPUT}/");

    let bmad_paths: Vec<String> = entries
        .iter()
        .filter(|e| e.kind == TreeEntryKind::Blob && e.path.starts_with(&bmad_prefix))
        .map(|e| e.path.clone())
        .collect();

    let sprint_status_path = bmad_paths
        .iter()
        .find(|p| p.contains(IMPLEMENTATION) && p.ends_with("sprint-status.yaml"))
        .cloned();

    let epics_path = bmad_paths
        .iter()
        .find(|p| {
            p.contains(PLANNING) && (p.ends_with("epics.md") || p.ends_with("epic.md"))
        })
        .cloned();

    let story_paths: Vec<String> = bmad_paths
        .iter()
        .filter(|p| {
            p.contains(IMPLEMENTATION)
                && p.ends_with(".md")
                && is_story_filename(file_name(p))
        })
        .cloned()
        .collect();

    let docs_folder = entries
        .iter()
        .find(|e| {
            e.kind == TreeEntryKind::Tree
                && !e.path.contains('/')
                && e.path.eq_ignore_ascii_case("docs")
        })
        .map(|e| e.path.clone());

    BmadLayout {
        sprint_status_path,
        epics_path,
        story_paths,
        bmad_paths,
        docs_folder,
    }
}
