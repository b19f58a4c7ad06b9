use std::collections::HashMap;

use regex::Regex;
use serde::Serialize;

use crate::epics::Epic;
use crate::sprint::{SprintEpicEntry, SprintStatus};
use crate::status::{EpicStatus, StoryStatus};
use crate::story::StoryDetail;

/// Output of the correlation pass: fresh collections, inputs untouched.
#[derive(Debug, Clone, Default)]
pub struct Correlated {
    pub epics: Vec<Epic>,
    pub stories: Vec<StoryDetail>,
}

/// Globally derived counters over the correlated story list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProjectStats {
    pub total_stories: usize,
    pub completed_stories: usize,
    pub in_progress_stories: usize,
    pub progress_percent: u32,
}

/// Turn a sprint-status slug like `1-1-project-initialization` into a
/// human-readable title (`Project Initialization`). A title that carries no
/// `N-N-` prefix passes through unchanged.
fn format_story_title(slug: &str) -> String {
    let prefix = Regex::new(r"^\d+-\d+-").expect("regex");
    let stripped = prefix.replace(slug, "");
    if stripped.is_empty() || stripped == slug {
        return slug.to_string();
    }
    stripped
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn percent(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u32
}

/// Merge the three parsed sources into final epic and story lists.
///
/// Sprint-status is authoritative over file-derived story status; epic
/// overrides from sprint-status win over aggregation; stories referenced
/// only by sprint-status become stubs appended after the real ones.
pub fn correlate(
    sprint_status: Option<&SprintStatus>,
    epics: &[Epic],
    stories: &[StoryDetail],
    epic_statuses: &[SprintEpicEntry],
) -> Correlated {
    let mut working: Vec<StoryDetail> = stories.to_vec();
    let mut by_id: HashMap<String, usize> = working
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id.clone(), i))
        .collect();

    if let Some(sprint) = sprint_status {
        for entry in &sprint.stories {
            match by_id.get(&entry.id) {
                Some(&i) => {
                    if entry.status != StoryStatus::Unknown {
                        working[i].status = entry.status;
                    }
                    if let Some(epic_id) = &entry.epic_id {
                        working[i].epic_id = epic_id.clone();
                    }
                }
                None => {
                    working.push(StoryDetail {
                        id: entry.id.clone(),
                        title: format_story_title(&entry.title),
                        status: entry.status,
                        epic_id: entry.epic_id.clone().unwrap_or_default(),
                        epic_title: None,
                        description: String::new(),
                        acceptance_criteria: Vec::new(),
                        tasks: Vec::new(),
                        completed_tasks: 0,
                        total_tasks: 0,
                    });
                    by_id.insert(entry.id.clone(), working.len() - 1);
                }
            }
        }
    }

    let overrides: HashMap<&str, EpicStatus> = epic_statuses
        .iter()
        .map(|e| (e.id.as_str(), e.status))
        .collect();

    let enriched: Vec<Epic> = epics
        .iter()
        .map(|epic| {
            let members: Vec<&StoryDetail> = working
                .iter()
                .filter(|s| s.epic_id == epic.id || epic.stories.contains(&s.id))
                .collect();
            let completed = members
                .iter()
                .filter(|s| s.status == StoryStatus::Done)
                .count();
            let total = members.len();

            let status = match overrides.get(epic.id.as_str()) {
                Some(&status) => status,
                None => {
                    if total > 0 && completed == total {
                        EpicStatus::Done
                    } else if completed > 0
                        || members.iter().any(|s| s.status == StoryStatus::InProgress)
                    {
                        EpicStatus::InProgress
                    } else {
                        EpicStatus::NotStarted
                    }
                }
            };

            Epic {
                status,
                total_stories: total,
                completed_stories: completed,
                progress_percent: percent(completed, total),
                ..epic.clone()
            }
        })
        .collect();

    for story in &mut working {
        if story.epic_id.is_empty() {
            continue;
        }
        if let Some(epic) = enriched.iter().find(|e| e.id == story.epic_id) {
            story.epic_title = Some(epic.title.clone());
        }
    }

    Correlated {
        epics: enriched,
        stories: working,
    }
}

/// Counters over the correlated story list. `total_stories` is the
/// correlated count itself; stub synthesis already folded in every story the
/// sprint document knows about, so the historical
/// `max(parsed, sprint-entries)` formula coincides with it.
pub fn project_stats(stories: &[StoryDetail]) -> ProjectStats {
    let completed = stories
        .iter()
        .filter(|s| s.status == StoryStatus::Done)
        .count();
    let in_progress = stories
        .iter()
        .filter(|s| s.status == StoryStatus::InProgress)
        .count();
    ProjectStats {
        total_stories: stories.len(),
        completed_stories: completed,
        in_progress_stories: in_progress,
        progress_percent: percent(completed, stories.len()),
    }
}
