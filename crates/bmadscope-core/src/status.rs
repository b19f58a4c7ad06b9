use serde::{Deserialize, Serialize};

/// Story status after normalization. Human-written files use many spellings;
/// every one of them collapses into one of these.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoryStatus {
    Done,
    InProgress,
    Review,
    Blocked,
    ReadyForDev,
    Backlog,
    Unknown,
}

impl StoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryStatus::Done => "done",
            StoryStatus::InProgress => "in-progress",
            StoryStatus::Review => "review",
            StoryStatus::Blocked => "blocked",
            StoryStatus::ReadyForDev => "ready-for-dev",
            StoryStatus::Backlog => "backlog",
            StoryStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EpicStatus {
    Done,
    InProgress,
    NotStarted,
}

impl EpicStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpicStatus::Done => "done",
            EpicStatus::InProgress => "in-progress",
            EpicStatus::NotStarted => "not-started",
        }
    }
}

impl std::fmt::Display for EpicStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map an arbitrary human-written status string onto [`StoryStatus`].
///
/// Case-insensitive, whitespace-trimmed, first match wins. Absent or
/// unrecognized input falls back to `Backlog`. Total over all strings.
pub fn normalize_story_status(raw: Option<&str>) -> StoryStatus {
    let Some(raw) = raw else {
        return StoryStatus::Backlog;
    };
    let s = raw.trim().to_lowercase();
    if s.is_empty() {
        return StoryStatus::Backlog;
    }
    if s == "done" || s == "complete" || s == "completed" {
        return StoryStatus::Done;
    }
    if s.contains("progress") || s == "started" {
        return StoryStatus::InProgress;
    }
    if s.contains("review") {
        return StoryStatus::Review;
    }
    if s == "blocked" {
        return StoryStatus::Blocked;
    }
    if s == "ready-for-dev" || s == "ready" {
        return StoryStatus::ReadyForDev;
    }
    StoryStatus::Backlog
}

/// Sibling normalizer for epic-level statuses.
pub fn normalize_epic_status(raw: Option<&str>) -> EpicStatus {
    let Some(raw) = raw else {
        return EpicStatus::NotStarted;
    };
    let s = raw.trim().to_lowercase();
    if s == "done" || s == "complete" || s == "completed" {
        return EpicStatus::Done;
    }
    if s.contains("progress") || s == "started" {
        return EpicStatus::InProgress;
    }
    EpicStatus::NotStarted
}
