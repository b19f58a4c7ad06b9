use regex::Regex;
use serde::Serialize;

use crate::status::EpicStatus;

pub const EPIC_DESCRIPTION_LIMIT: usize = 500;

/// One epic as read from the epics markdown document. Status and counts are
/// raw-shell placeholders here; only the correlation engine fills them in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Epic {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: EpicStatus,
    /// Story-id references found in the epic body, deduplicated in
    /// encounter order.
    pub stories: Vec<String>,
    pub total_stories: usize,
    pub completed_stories: usize,
    pub progress_percent: u32,
}

/// Degraded-success result: a parse always yields the epics it could read,
/// plus an optional diagnostic when part of the document was unreadable.
#[derive(Debug, Clone, Default)]
pub struct ParsedEpics {
    pub epics: Vec<Epic>,
    pub error: Option<String>,
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Scan an epics markdown document into epic records.
///
/// A `## Epic N: Title` heading (the `Epic` word, and the separator style,
/// both vary across conventions) opens a new epic; story references like
/// `Story 1.2` or `S1-3` inside the body are collected; all other non-blank,
/// non-heading lines become the description.
pub fn parse_epics(content: &str) -> ParsedEpics {
    let heading = Regex::new(r"(?i)^##\s+(?:Epic\s+)?(\d+)[\s:.—-]+(.+)").expect("regex");
    let story_ref = Regex::new(r"(?i)(?:story|S)[\s-]*(\d+(?:\.\d+)?)").expect("regex");

    let mut epics: Vec<Epic> = Vec::new();
    let mut current: Option<(String, String)> = None;
    let mut desc_lines: Vec<&str> = Vec::new();
    let mut story_ids: Vec<String> = Vec::new();

    fn flush(
        current: &mut Option<(String, String)>,
        desc: &mut Vec<&str>,
        ids: &mut Vec<String>,
        out: &mut Vec<Epic>,
    ) {
        if let Some((id, title)) = current.take() {
            out.push(Epic {
                id,
                title,
                description: truncate_chars(desc.join("\n").trim(), EPIC_DESCRIPTION_LIMIT),
                status: EpicStatus::NotStarted,
                total_stories: ids.len(),
                completed_stories: 0,
                progress_percent: 0,
                stories: std::mem::take(ids),
            });
        }
        desc.clear();
    }

    for line in content.lines() {
        if let Some(caps) = heading.captures(line) {
            flush(&mut current, &mut desc_lines, &mut story_ids, &mut epics);
            current = Some((caps[1].to_string(), caps[2].trim().to_string()));
            continue;
        }

        if current.is_none() {
            continue;
        }

        for caps in story_ref.captures_iter(line) {
            let id = caps[1].trim().to_string();
            if !id.is_empty() && !story_ids.contains(&id) {
                story_ids.push(id);
            }
        }

        if !line.trim().is_empty() && !line.starts_with('#') {
            desc_lines.push(line);
        }
    }
    flush(&mut current, &mut desc_lines, &mut story_ids, &mut epics);

    ParsedEpics {
        epics,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_input_yields_no_epics_and_no_error() {
        let result = parse_epics("");
        assert!(result.epics.is_empty());
        assert!(result.error.is_none());
    }

    #[test]
    fn story_references_deduplicate_in_encounter_order() {
        let doc = "\
## Epic 1: Foundation
Covers Story 1.1 and then Story 1.1 again, plus Story 1.2.

## Epic 2: Delivery
Only Story 2.1 here.
";
        let result = parse_epics(doc);
        assert_eq!(result.epics.len(), 2);
        assert_eq!(result.epics[0].stories, vec!["1.1", "1.2"]);
        assert_eq!(result.epics[0].total_stories, 2);
        assert_eq!(result.epics[1].stories, vec!["2.1"]);
    }

    #[test]
    fn heading_separator_styles_all_open_an_epic() {
        let doc = "\
## Epic 1: Colon
text
## 2. Dotted
text
## 3 — Em dash
text
## Epic 4 - Hyphen
text
";
        let result = parse_epics(doc);
        let ids: Vec<&str> = result.epics.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
        assert_eq!(result.epics[1].title, "Dotted");
        assert_eq!(result.epics[2].title, "Em dash");
    }

    #[test]
    fn raw_epics_carry_placeholder_status_and_counts() {
        let result = parse_epics("## Epic 1: A\nStory 1.1\n");
        let epic = &result.epics[0];
        assert_eq!(epic.status, EpicStatus::NotStarted);
        assert_eq!(epic.completed_stories, 0);
        assert_eq!(epic.progress_percent, 0);
    }

    #[test]
    fn description_accumulates_body_and_truncates_to_limit() {
        let long_line = "x".repeat(600);
        let doc = format!("## Epic 1: Big\n{long_line}\n");
        let result = parse_epics(&doc);
        let desc = &result.epics[0].description;
        assert_eq!(desc.chars().count(), EPIC_DESCRIPTION_LIMIT);
        assert!(long_line.starts_with(desc.as_str()));
    }

    #[test]
    fn sub_headings_and_preamble_are_not_description() {
        let doc = "\
Preamble before any epic.

## Epic 1: A
### Goals
Real description line.
";
        let result = parse_epics(doc);
        assert_eq!(result.epics[0].description, "Real description line.");
    }

    #[test]
    fn last_open_epic_is_flushed_at_end_of_input() {
        let result = parse_epics("## Epic 7: Tail\nbody");
        assert_eq!(result.epics.len(), 1);
        assert_eq!(result.epics[0].id, "7");
    }
}
