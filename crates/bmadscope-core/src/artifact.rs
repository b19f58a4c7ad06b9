use serde::Serialize;
use serde_yaml::Value;

use crate::status::{normalize_story_status, StoryStatus};
use crate::story::{split_front_matter, value_to_string};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Markdown,
    Yaml,
    Json,
    Text,
}

/// Workflow metadata lifted from a BMAD file's structured data, when any of
/// the known keys are present (camelCase and snake_case spellings both
/// occur in the wild).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArtifactMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StoryStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps_completed: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_type: Option<String>,
}

impl ArtifactMetadata {
    fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.steps_completed.is_none()
            && self.last_step.is_none()
            && self.title.is_none()
            && self.completed_at.is_none()
            && self.workflow_type.is_none()
    }
}

/// A BMAD file prepared for display: frontmatter split off, metadata
/// extracted, body normalized. Parsing problems land in `parse_error`
/// instead of failing the call.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedBmadFile {
    pub content_type: ContentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontmatter: Option<serde_yaml::Mapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ArtifactMetadata>,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

fn get_string(map: &serde_yaml::Mapping, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        map.get(&Value::String(key.to_string()))
            .and_then(value_to_string)
    })
}

fn get_string_list(map: &serde_yaml::Mapping, keys: &[&str]) -> Option<Vec<String>> {
    keys.iter().find_map(|key| {
        match map.get(&Value::String(key.to_string())) {
            Some(Value::Sequence(seq)) => Some(
                seq.iter()
                    .filter_map(value_to_string)
                    .collect::<Vec<String>>(),
            ),
            _ => None,
        }
    })
}

fn extract_metadata(map: &serde_yaml::Mapping) -> Option<ArtifactMetadata> {
    let metadata = ArtifactMetadata {
        status: get_string(map, &["status"])
            .map(|raw| normalize_story_status(Some(&raw))),
        steps_completed: get_string_list(map, &["stepsCompleted", "steps_completed"]),
        last_step: get_string(map, &["lastStep", "last_step"]),
        title: get_string(map, &["title"]),
        completed_at: get_string(map, &["completedAt", "completed_at"]),
        workflow_type: get_string(map, &["workflowType", "workflow_type"]),
    };
    if metadata.is_empty() {
        None
    } else {
        Some(metadata)
    }
}

fn degraded(content: &str, content_type: ContentType, error: String) -> ParsedBmadFile {
    ParsedBmadFile {
        content_type,
        frontmatter: None,
        metadata: None,
        body: content.to_string(),
        parse_error: Some(error),
    }
}

/// Parse any BMAD file for presentation. Pure, never fails: malformed
/// content degrades to the raw text plus a `parse_error` message.
pub fn parse_bmad_file(content: &str, content_type: ContentType) -> ParsedBmadFile {
    match content_type {
        ContentType::Markdown => {
            let (front, body) = split_front_matter(content);
            let frontmatter = match front {
                Some(front) => match serde_yaml::from_str::<Value>(&front) {
                    Ok(Value::Mapping(map)) if !map.is_empty() => Some(map),
                    Ok(_) => None,
                    Err(err) => return degraded(content, content_type, err.to_string()),
                },
                None => None,
            };
            ParsedBmadFile {
                content_type,
                metadata: frontmatter.as_ref().and_then(extract_metadata),
                frontmatter,
                body: body.to_string(),
                parse_error: None,
            }
        }
        ContentType::Yaml => match serde_yaml::from_str::<Value>(content) {
            Ok(Value::Mapping(map)) => ParsedBmadFile {
                content_type,
                frontmatter: None,
                metadata: extract_metadata(&map),
                body: content.to_string(),
                parse_error: None,
            },
            Ok(_) => ParsedBmadFile {
                content_type,
                frontmatter: None,
                metadata: None,
                body: content.to_string(),
                parse_error: None,
            },
            Err(err) => degraded(content, content_type, err.to_string()),
        },
        ContentType::Json => match serde_json::from_str::<serde_json::Value>(content) {
            Ok(value) => ParsedBmadFile {
                content_type,
                frontmatter: None,
                metadata: None,
                body: serde_json::to_string_pretty(&value)
                    .unwrap_or_else(|_| content.to_string()),
                parse_error: None,
            },
            Err(err) => degraded(content, content_type, err.to_string()),
        },
        ContentType::Text => ParsedBmadFile {
            content_type,
            frontmatter: None,
            metadata: None,
            body: content.to_string(),
            parse_error: None,
        },
    }
}

/// Pick a content type from a file extension, defaulting to plain text.
pub fn content_type_for_path(path: &str) -> ContentType {
    let ext = path.rsplit('.').next().unwrap_or("").to_lowercase();
    match ext.as_str() {
        "md" | "markdown" => ContentType::Markdown,
        "yaml" | "yml" => ContentType::Yaml,
        "json" => ContentType::Json,
        _ => ContentType::Text,
    }
}
