use regex::Regex;
use serde::Serialize;
use serde_yaml::Value;
use thiserror::Error;

use crate::status::{
    normalize_epic_status, normalize_story_status, EpicStatus, StoryStatus,
};
use crate::story::value_to_string;

/// One story row from the sprint-status document. This source is
/// authoritative: its status overrides whatever a story file says.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SprintStoryEntry {
    pub id: String,
    pub title: String,
    pub status: StoryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epic_id: Option<String>,
}

/// Sprint snapshot: optional metadata plus per-story status entries.
/// Immutable once parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SprintStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub stories: Vec<SprintStoryEntry>,
}

/// Side-channel epic status override, independent of story aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SprintEpicEntry {
    pub id: String,
    pub status: EpicStatus,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedSprintData {
    pub sprint_status: SprintStatus,
    pub epic_statuses: Vec<SprintEpicEntry>,
}

#[derive(Debug, Error)]
pub enum SprintParseError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("sprint-status document is not a mapping")]
    NotAMapping,
}

fn mapping_get<'a>(map: &'a serde_yaml::Mapping, key: &str) -> Option<&'a Value> {
    map.get(&Value::String(key.to_string()))
}

fn mapping_get_string(map: &serde_yaml::Mapping, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        mapping_get(map, key)
            .and_then(value_to_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Parse a sprint-status YAML document.
///
/// Two historical shapes are read and merged: the `development_status` map
/// (`epic-N` and `N-N-slug` keys) and the legacy entry array under
/// `stories` / `story_status` / `items`. Duplicate story ids across the two
/// are kept here; the correlation engine collapses them by map overwrite.
pub fn parse_sprint_status(content: &str) -> Result<ParsedSprintData, SprintParseError> {
    let value: Value = serde_yaml::from_str(content)?;
    let Value::Mapping(doc) = value else {
        return Err(SprintParseError::NotAMapping);
    };

    let epic_key = Regex::new(r"^epic-(\d+)$").expect("regex");
    let story_key = Regex::new(r"^(\d+)-(\d+)-(.+)$").expect("regex");

    let mut stories: Vec<SprintStoryEntry> = Vec::new();
    let mut epic_statuses: Vec<SprintEpicEntry> = Vec::new();

    if let Some(Value::Mapping(dev_status)) = mapping_get(&doc, "development_status") {
        for (key, value) in dev_status {
            let Some(key) = value_to_string(key) else {
                continue;
            };
            let status_str = value_to_string(value);

            if let Some(caps) = epic_key.captures(&key) {
                epic_statuses.push(SprintEpicEntry {
                    id: caps[1].to_string(),
                    status: normalize_epic_status(status_str.as_deref()),
                });
                continue;
            }

            if key.contains("retrospective") {
                continue;
            }

            if let Some(caps) = story_key.captures(&key) {
                stories.push(SprintStoryEntry {
                    id: format!("{}.{}", &caps[1], &caps[2]),
                    title: key.clone(),
                    status: normalize_story_status(status_str.as_deref()),
                    epic_id: Some(caps[1].to_string()),
                });
            }
        }
    }

    let legacy = ["stories", "story_status", "items"]
        .iter()
        .find_map(|key| match mapping_get(&doc, key) {
            Some(Value::Sequence(seq)) => Some(seq),
            _ => None,
        });
    if let Some(entries) = legacy {
        for entry in entries {
            let Value::Mapping(entry) = entry else {
                continue;
            };
            let id = mapping_get_string(entry, &["id", "story_id", "name"]).unwrap_or_default();
            let title = mapping_get_string(entry, &["title", "name", "id"]).unwrap_or_default();
            let status = mapping_get(entry, "status").and_then(value_to_string);
            stories.push(SprintStoryEntry {
                id,
                title,
                status: normalize_story_status(status.as_deref()),
                epic_id: mapping_get_string(entry, &["epic_id", "epic"]),
            });
        }
    }

    let sprint_status = SprintStatus {
        sprint: mapping_get_string(&doc, &["sprint", "project"]),
        status: mapping_get_string(&doc, &["status"]),
        start_date: mapping_get_string(&doc, &["start_date", "generated"]),
        end_date: mapping_get_string(&doc, &["end_date"]),
        stories,
    };

    Ok(ParsedSprintData {
        sprint_status,
        epic_statuses,
    })
}
