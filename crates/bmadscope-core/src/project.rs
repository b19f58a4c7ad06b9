use futures::future::join_all;
use serde::Serialize;

use crate::classify::{classify_tree, file_name, BMAD_OUTPUT};
use crate::config::RepoConfig;
use crate::correlate::{correlate, project_stats};
use crate::epics::{parse_epics, Epic};
use crate::source::{ContentSource, SourceError, TreeEntryKind};
use crate::sprint::{parse_sprint_status, SprintEpicEntry, SprintStatus};
use crate::story::{parse_story, StoryDetail};
use crate::tree::{build_file_tree, FileTreeNode};

/// One file the assembler attempted but could not use, with the reason.
/// Accumulated, never thrown past the parser boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseErrorEntry {
    pub file: String,
    pub error: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseHealthReport {
    pub errors: Vec<ParseErrorEntry>,
    pub total_files: usize,
    pub successful_files: usize,
}

/// The assembled project snapshot: repository identity, the three derived
/// collections, navigation trees, parse health, and global counters.
#[derive(Debug, Clone, Serialize)]
pub struct BmadProject {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub display_name: String,
    pub sprint_status: Option<SprintStatus>,
    pub epics: Vec<Epic>,
    pub stories: Vec<StoryDetail>,
    pub file_tree: Vec<FileTreeNode>,
    pub bmad_files: Vec<String>,
    pub docs_tree: Vec<FileTreeNode>,
    pub docs_folder_name: Option<String>,
    pub parse_health: ParseHealthReport,
    pub total_stories: usize,
    pub completed_stories: usize,
    pub in_progress_stories: usize,
    pub progress_percent: u32,
}

#[derive(Debug, Clone, PartialEq)]
enum FetchKind {
    Sprint,
    Epics,
    Story,
}

/// Assemble one project snapshot from a content source.
///
/// The repository tree is classified, every classified file is fetched in
/// one concurrent batch, and each file is then parsed independently. A
/// failed fetch or parse is recorded against that file and never aborts the
/// rest. Missing optional sources are not attempted and not counted.
pub async fn get_bmad_project<S: ContentSource + ?Sized>(
    source: &S,
    config: &RepoConfig,
) -> Result<BmadProject, SourceError> {
    let entries = source
        .repo_tree(&config.owner, &config.name, &config.branch)
        .await?;
    let layout = classify_tree(&entries);

    let all_paths: Vec<String> = entries
        .iter()
        .filter(|e| e.kind == TreeEntryKind::Blob)
        .map(|e| e.path.clone())
        .collect();

    let mut targets: Vec<(FetchKind, String)> = Vec::new();
    if let Some(path) = &layout.sprint_status_path {
        targets.push((FetchKind::Sprint, path.clone()));
    }
    if let Some(path) = &layout.epics_path {
        targets.push((FetchKind::Epics, path.clone()));
    }
    for path in &layout.story_paths {
        targets.push((FetchKind::Story, path.clone()));
    }

    // One batch, every fetch resolved on its own; slow or failing files do
    // not hold back the others.
    let results = join_all(targets.into_iter().map(|(kind, path)| async move {
        let content = source
            .file_content(&config.owner, &config.name, &config.branch, &path)
            .await;
        (kind, path, content)
    }))
    .await;

    let mut parse_errors: Vec<ParseErrorEntry> = Vec::new();
    let mut total_files = 0usize;
    let mut sprint_status: Option<SprintStatus> = None;
    let mut epic_statuses: Vec<SprintEpicEntry> = Vec::new();
    let mut raw_epics: Vec<Epic> = Vec::new();
    let mut raw_stories: Vec<StoryDetail> = Vec::new();

    for (kind, path, content) in results {
        total_files += 1;
        let content_type = match kind {
            FetchKind::Sprint => "sprint-status",
            FetchKind::Epics => "epic",
            FetchKind::Story => "story",
        };
        let content = match content {
            Ok(content) => content,
            Err(err) => {
                parse_errors.push(ParseErrorEntry {
                    file: path,
                    error: format!("file unavailable: {err}"),
                    content_type: content_type.to_string(),
                });
                continue;
            }
        };

        match kind {
            FetchKind::Sprint => match parse_sprint_status(&content) {
                Ok(parsed) => {
                    sprint_status = Some(parsed.sprint_status);
                    epic_statuses = parsed.epic_statuses;
                }
                Err(err) => parse_errors.push(ParseErrorEntry {
                    file: path,
                    error: err.to_string(),
                    content_type: content_type.to_string(),
                }),
            },
            FetchKind::Epics => {
                let parsed = parse_epics(&content);
                raw_epics = parsed.epics;
                if let Some(error) = parsed.error {
                    parse_errors.push(ParseErrorEntry {
                        file: path,
                        error,
                        content_type: content_type.to_string(),
                    });
                }
            }
            FetchKind::Story => match parse_story(&content, file_name(&path)) {
                Ok(story) => raw_stories.push(story),
                Err(err) => parse_errors.push(ParseErrorEntry {
                    file: path,
                    error: err.to_string(),
                    content_type: content_type.to_string(),
                }),
            },
        }
    }

    if !parse_errors.is_empty() {
        log::warn!(
            "{}: {} parse errors out of {} files",
            config.slug(),
            parse_errors.len(),
            total_files
        );
    }

    let correlated = correlate(
        sprint_status.as_ref(),
        &raw_epics,
        &raw_stories,
        &epic_statuses,
    );

    let doc_paths: Vec<String> = layout
        .bmad_paths
        .iter()
        .filter(|p| !layout.story_paths.contains(*p))
        .cloned()
        .collect();
    let file_tree = build_file_tree(&doc_paths, BMAD_OUTPUT);

    let docs_tree = match &layout.docs_folder {
        Some(folder) => {
            let prefix = format!("{folder}/");
            let docs_paths: Vec<String> = all_paths
                .iter()
                .filter(|p| p.starts_with(&prefix))
                .cloned()
                .collect();
            build_file_tree(&docs_paths, folder)
        }
        None => Vec::new(),
    };

    let stats = project_stats(&correlated.stories);
    let successful_files = total_files - parse_errors.len();

    Ok(BmadProject {
        owner: config.owner.clone(),
        repo: config.name.clone(),
        branch: config.branch.clone(),
        display_name: config.display_name().to_string(),
        sprint_status,
        epics: correlated.epics,
        stories: correlated.stories,
        file_tree,
        bmad_files: layout.bmad_paths,
        docs_tree,
        docs_folder_name: layout.docs_folder,
        parse_health: ParseHealthReport {
            errors: parse_errors,
            total_files,
            successful_files,
        },
        total_stories: stats.total_stories,
        completed_stories: stats.completed_stories,
        in_progress_stories: stats.in_progress_stories,
        progress_percent: stats.progress_percent,
    })
}
