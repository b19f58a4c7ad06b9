use regex::Regex;
use serde::Serialize;
use serde_yaml::Value;
use thiserror::Error;

use crate::status::{normalize_story_status, StoryStatus};

pub const STORY_DESCRIPTION_LIMIT: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryTask {
    pub description: String,
    pub completed: bool,
}

/// One story, parsed from a real markdown file or synthesized as a stub by
/// the correlation engine. `epic_title` stays empty until correlation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryDetail {
    pub id: String,
    pub title: String,
    pub status: StoryStatus,
    pub epic_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epic_title: Option<String>,
    pub description: String,
    pub acceptance_criteria: Vec<String>,
    pub tasks: Vec<StoryTask>,
    pub completed_tasks: usize,
    pub total_tasks: usize,
}

#[derive(Debug, Error)]
pub enum StoryParseError {
    #[error("invalid YAML frontmatter: {0}")]
    Frontmatter(#[from] serde_yaml::Error),
}

/// Split a leading `---` delimited frontmatter block off a markdown body.
///
/// Returns `(frontmatter, body)`; an absent or unclosed block yields no
/// frontmatter and the untouched content as body.
pub(crate) fn split_front_matter(text: &str) -> (Option<String>, &str) {
    let trimmed = text.trim_start();
    if !trimmed.starts_with("---") {
        return (None, text);
    }
    let mut lines = trimmed.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return (None, text);
    };
    if first.trim() != "---" {
        return (None, text);
    }

    let mut offset = first.len();
    let mut front_end = None;
    for line in lines {
        if line.trim() == "---" {
            front_end = Some((offset, offset + line.len()));
            break;
        }
        offset += line.len();
    }
    match front_end {
        Some((front_end, body_start)) => {
            let front = trimmed[first.len()..front_end].to_string();
            (Some(front), &trimmed[body_start..])
        }
        None => (None, text),
    }
}

pub(crate) fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(val) => Some(val.clone()),
        Value::Number(num) => Some(num.to_string()),
        Value::Bool(val) => Some(val.to_string()),
        _ => None,
    }
}

fn mapping_get(map: &serde_yaml::Mapping, key: &str) -> Option<String> {
    map.get(&Value::String(key.to_string()))
        .and_then(value_to_string)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Derive (id, epic_id) from the filename alone.
///
/// Current convention `<epic>-<story>-<slug>.md` wins over the legacy
/// `story-N` / `story_N.N` prefix; anything else falls back to the filename
/// with its extension stripped.
fn identity_from_filename(filename: &str) -> (String, String) {
    let current = Regex::new(r"^(\d+)-(\d+)-").expect("regex");
    if let Some(caps) = current.captures(filename) {
        return (format!("{}.{}", &caps[1], &caps[2]), caps[1].to_string());
    }

    let legacy = Regex::new(r"(?i)story[_-]?(\d+(?:[._-]\d+)?)").expect("regex");
    if let Some(caps) = legacy.captures(filename) {
        let sep = Regex::new(r"[._-]").expect("regex");
        let id = sep.replace(&caps[1], ".").into_owned();
        let epic_id = id
            .split_once('.')
            .map(|(epic, _)| epic.to_string())
            .unwrap_or_default();
        return (id, epic_id);
    }

    let id = filename
        .strip_suffix(".md")
        .or_else(|| filename.strip_suffix(".MD"))
        .unwrap_or(filename)
        .to_string();
    (id, String::new())
}

/// Parse one story markdown file.
///
/// Maximally permissive: any input produces a record. The only error path is
/// a frontmatter block whose YAML does not parse.
pub fn parse_story(content: &str, filename: &str) -> Result<StoryDetail, StoryParseError> {
    let (mut id, mut epic_id) = identity_from_filename(filename);

    let (front, body) = split_front_matter(content);
    let mut fm_status: Option<String> = None;
    let mut fm_title: Option<String> = None;
    if let Some(front) = front {
        let value: Value = serde_yaml::from_str(&front)?;
        if let Value::Mapping(map) = value {
            fm_status = mapping_get(&map, "status").or_else(|| mapping_get(&map, "state"));
            fm_title = mapping_get(&map, "title");
            if let Some(fm_id) = mapping_get(&map, "id") {
                id = fm_id;
            }
            if let Some(fm_epic) =
                mapping_get(&map, "epic_id").or_else(|| mapping_get(&map, "epic"))
            {
                epic_id = fm_epic;
            }
        }
    }

    let heading = Regex::new(r"(?m)^#\s+(?:Story\s+[\d.]+[:\s]+)?(.+)").expect("regex");
    let title = fm_title
        .or_else(|| {
            heading
                .captures(body)
                .map(|caps| caps[1].trim().to_string())
        })
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("Story {id}"));

    let status_line = Regex::new(r"(?mi)^Status:\s*(.+)").expect("regex");
    let raw_status = fm_status.or_else(|| {
        status_line
            .captures(body)
            .map(|caps| caps[1].trim().to_string())
    });
    let status = normalize_story_status(raw_status.as_deref());

    let acceptance_criteria = extract_acceptance_criteria(body);

    let task_re = Regex::new(r"- \[([ xX])\]\s+(.+)").expect("regex");
    let tasks: Vec<StoryTask> = task_re
        .captures_iter(body)
        .map(|caps| StoryTask {
            completed: caps[1].eq_ignore_ascii_case("x"),
            description: caps[2].trim().to_string(),
        })
        .collect();
    let completed_tasks = tasks.iter().filter(|t| t.completed).count();
    let total_tasks = tasks.len();

    Ok(StoryDetail {
        id,
        title,
        status,
        epic_id,
        epic_title: None,
        description: truncate_chars(body.trim(), STORY_DESCRIPTION_LIMIT),
        acceptance_criteria,
        completed_tasks,
        total_tasks,
        tasks,
    })
}

/// Collect items under a `## Acceptance Criteria` heading: numbered,
/// bulleted, or `**Given/And/Then**`-prefixed lines, list markers stripped.
fn extract_acceptance_criteria(body: &str) -> Vec<String> {
    let section_heading = Regex::new(r"(?i)^#{2,}\s*acceptance criteria\s*$").expect("regex");
    let numbered_or_bullet = Regex::new(r"^\s*(?:\d+\.\s+|[-*]\s+)(.+)").expect("regex");
    let given_prefixed = Regex::new(r"^\s*(\*\*(?:Given|And|Then)\*\*.*)").expect("regex");

    let mut criteria = Vec::new();
    let mut in_section = false;
    for line in body.lines() {
        if section_heading.is_match(line.trim_end()) {
            in_section = true;
            continue;
        }
        if in_section && line.starts_with("##") {
            break;
        }
        if !in_section {
            continue;
        }
        if let Some(caps) = numbered_or_bullet.captures(line) {
            criteria.push(caps[1].trim().to_string());
        } else if let Some(caps) = given_prefixed.captures(line) {
            criteria.push(caps[1].trim().to_string());
        }
    }
    criteria
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn filename_id_takes_the_current_convention_first() {
        let story = parse_story("# My Story\n\nSome content", "1-2-my-story.md").expect("parse");
        assert_eq!(story.id, "1.2");
        assert_eq!(story.epic_id, "1");
        assert_eq!(story.status, StoryStatus::Backlog);
    }

    #[test]
    fn legacy_filenames_normalize_their_separator() {
        let story = parse_story("# Legacy", "story-1.md").expect("parse");
        assert_eq!(story.id, "1");
        assert_eq!(story.epic_id, "");

        let story = parse_story("# Legacy", "story_2_3.md").expect("parse");
        assert_eq!(story.id, "2.3");
        assert_eq!(story.epic_id, "2");

        let story = parse_story("# Legacy", "story-4.1.md").expect("parse");
        assert_eq!(story.id, "4.1");
        assert_eq!(story.epic_id, "4");
    }

    #[test]
    fn unmatched_filename_falls_back_to_the_stem() {
        let story = parse_story("body", "notes.md").expect("parse");
        assert_eq!(story.id, "notes");
        assert_eq!(story.epic_id, "");
    }

    #[test]
    fn frontmatter_overrides_filename_identity() {
        let content = "---\nid: 5.1\nstatus: in-progress\nepic_id: 5\n---\n# Story";
        let story = parse_story(content, "1-1-test.md").expect("parse");
        assert_eq!(story.id, "5.1");
        assert_eq!(story.epic_id, "5");
        assert_eq!(story.status, StoryStatus::InProgress);
    }

    #[test]
    fn frontmatter_state_and_epic_aliases_are_honored() {
        let content = "---\nstate: done\nepic: 3\ntitle: My Title\n---\n# Ignored Heading";
        let story = parse_story(content, "1-1-test.md").expect("parse");
        assert_eq!(story.status, StoryStatus::Done);
        assert_eq!(story.epic_id, "3");
        assert_eq!(story.title, "My Title");
    }

    #[test]
    fn heading_title_strips_the_story_prefix() {
        let story =
            parse_story("# Story 1.2: Project Setup\n\nBody", "1-2-project-setup.md")
                .expect("parse");
        assert_eq!(story.title, "Project Setup");
    }

    #[test]
    fn title_falls_back_to_the_story_id() {
        let story = parse_story("no heading here", "1-2-x.md").expect("parse");
        assert_eq!(story.title, "Story 1.2");
    }

    #[test]
    fn status_line_in_body_is_used_when_frontmatter_is_silent() {
        let story = parse_story("# T\n\nstatus: Review\n", "1-1-t.md").expect("parse");
        assert_eq!(story.status, StoryStatus::Review);
    }

    #[test]
    fn frontmatter_status_beats_the_body_status_line() {
        let content = "---\nstatus: done\n---\n# T\nStatus: blocked\n";
        let story = parse_story(content, "1-1-t.md").expect("parse");
        assert_eq!(story.status, StoryStatus::Done);
    }

    #[test]
    fn acceptance_criteria_accept_numbered_bulleted_and_given_items() {
        let content = "\
# T

## Acceptance Criteria

1. First criterion
- Second criterion
* Third criterion
**Given** a precondition
**Then** an outcome

## Tasks
- [ ] not a criterion
";
        let story = parse_story(content, "1-1-t.md").expect("parse");
        assert_eq!(
            story.acceptance_criteria,
            vec![
                "First criterion",
                "Second criterion",
                "Third criterion",
                "**Given** a precondition",
                "**Then** an outcome",
            ]
        );
    }

    #[test]
    fn tasks_count_checkboxes_anywhere_in_the_body() {
        let content = "\
# T

## Tasks
- [x] done one
- [ ] open one

## Later
- [X] done two
";
        let story = parse_story(content, "1-1-t.md").expect("parse");
        assert_eq!(story.total_tasks, 3);
        assert_eq!(story.completed_tasks, 2);
        assert_eq!(story.tasks[1].description, "open one");
        assert!(!story.tasks[1].completed);
    }

    #[test]
    fn description_is_a_truncated_prefix_of_the_body() {
        let body = "y".repeat(2000);
        let story = parse_story(&body, "1-1-t.md").expect("parse");
        assert_eq!(story.description.chars().count(), STORY_DESCRIPTION_LIMIT);
        assert!(body.starts_with(&story.description));
    }

    #[test]
    fn unclosed_frontmatter_is_treated_as_body() {
        let content = "---\ntitle: Dropped\n# Not closed";
        let story = parse_story(content, "1-1-t.md").expect("parse");
        // The unclosed block never becomes frontmatter: the title comes from
        // the body heading and the body keeps the raw text.
        assert_eq!(story.title, "Not closed");
        assert!(story.description.contains("title: Dropped"));
    }

    #[test]
    fn invalid_frontmatter_yaml_is_the_error_path() {
        let content = "---\nstatus: [unclosed\n---\n# T";
        assert!(parse_story(content, "1-1-t.md").is_err());
    }

    #[test]
    fn minimal_input_still_produces_a_record() {
        let story = parse_story("", "1-1-min.md").expect("parse");
        assert_eq!(story.id, "1.1");
        assert_eq!(story.title, "Story 1.1");
        assert_eq!(story.description, "");
        assert!(story.tasks.is_empty());
        assert!(story.acceptance_criteria.is_empty());
    }
}
