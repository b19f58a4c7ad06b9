use std::collections::HashMap;

use async_trait::async_trait;

use bmadscope_core::config::RepoConfig;
use bmadscope_core::project::get_bmad_project;
use bmadscope_core::source::{ContentSource, SourceError, TreeEntry};
use bmadscope_core::status::{EpicStatus, StoryStatus};

struct FakeRepo {
    entries: Vec<TreeEntry>,
    files: HashMap<String, String>,
    failing: Vec<String>,
}

impl FakeRepo {
    fn new() -> Self {
        FakeRepo {
            entries: Vec::new(),
            files: HashMap::new(),
            failing: Vec::new(),
        }
    }

    fn file(mut self, path: &str, content: &str) -> Self {
        self.entries.push(TreeEntry::blob(path));
        self.files.insert(path.to_string(), content.to_string());
        self
    }

    fn dir(mut self, path: &str) -> Self {
        self.entries.push(TreeEntry::tree(path));
        self
    }

    fn failing(mut self, path: &str) -> Self {
        self.entries.push(TreeEntry::blob(path));
        self.failing.push(path.to_string());
        self
    }
}

#[async_trait]
impl ContentSource for FakeRepo {
    async fn repo_tree(
        &self,
        _owner: &str,
        _repo: &str,
        _branch: &str,
    ) -> Result<Vec<TreeEntry>, SourceError> {
        Ok(self.entries.clone())
    }

    async fn file_content(
        &self,
        _owner: &str,
        _repo: &str,
        _branch: &str,
        path: &str,
    ) -> Result<String, SourceError> {
        if self.failing.iter().any(|p| p == path) {
            return Err(SourceError::Fetch("connection reset".to_string()));
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(path.to_string()))
    }
}

fn repo_config() -> RepoConfig {
    RepoConfig {
        owner: "acme".to_string(),
        name: "costingo".to_string(),
        branch: "main".to_string(),
        display_name: Some("Costingo".to_string()),
    }
}

const EPICS_MD: &str = "\
## Epic 1: Foundation
Covers Story 1.1 and Story 1.2 and Story 1.3.

## Epic 2: Delivery
Ships the product.
";

const SPRINT_YAML: &str = "\
project: costingo
generated: 2026-02-01
development_status:
  epic-1: in-progress
  1-1-project-initialization: done
  1-2-auth-flow: in-progress
  1-3-billing: backlog
  1-9-retrospective: done
";

const STORY_1_1: &str = "\
# Story 1.1: Project Initialization

Status: backlog

## Acceptance Criteria
1. Repo scaffolded

## Tasks
- [x] Create workspace
- [ ] Wire CI
";

const STORY_1_2: &str = "\
---
status: review
---
# Auth Flow
";

fn full_repo() -> FakeRepo {
    FakeRepo::new()
        .file("_bmad-output/planning-artifacts/epics.md", EPICS_MD)
        .file(
            "_bmad-output/implementation-artifacts/sprint-status.yaml",
            SPRINT_YAML,
        )
        .file(
            "_bmad-output/implementation-artifacts/1-1-project-initialization.md",
            STORY_1_1,
        )
        .file(
            "_bmad-output/implementation-artifacts/1-2-auth-flow.md",
            STORY_1_2,
        )
        .file("_bmad-output/planning-artifacts/prd.md", "# PRD\n")
        .dir("Docs")
        .file("Docs/guide.md", "# Guide\n")
        .file("README.md", "# Readme\n")
}

#[tokio::test]
async fn assembles_a_full_project() {
    let project = get_bmad_project(&full_repo(), &repo_config())
        .await
        .expect("assemble");

    assert_eq!(project.display_name, "Costingo");
    assert_eq!(project.parse_health.total_files, 4);
    assert_eq!(project.parse_health.successful_files, 4);
    assert!(project.parse_health.errors.is_empty());

    // Sprint status overrides file-derived status, and 1-3 becomes a stub.
    let story_1_1 = project.stories.iter().find(|s| s.id == "1.1").expect("1.1");
    assert_eq!(story_1_1.status, StoryStatus::Done);
    assert_eq!(story_1_1.epic_title.as_deref(), Some("Foundation"));
    let stub = project.stories.iter().find(|s| s.id == "1.3").expect("stub");
    assert_eq!(stub.title, "Billing");
    assert!(stub.description.is_empty());
    assert!(!project.stories.iter().any(|s| s.id == "1.9"));

    // Epic 1 takes its status from the sprint override.
    let epic_1 = project.epics.iter().find(|e| e.id == "1").expect("epic 1");
    assert_eq!(epic_1.status, EpicStatus::InProgress);
    assert_eq!(epic_1.total_stories, 3);
    assert_eq!(epic_1.completed_stories, 1);
    assert_eq!(epic_1.progress_percent, 33);
    let epic_2 = project.epics.iter().find(|e| e.id == "2").expect("epic 2");
    assert_eq!(epic_2.status, EpicStatus::NotStarted);

    assert_eq!(project.total_stories, 3);
    assert_eq!(project.total_stories, project.stories.len());
    assert_eq!(project.completed_stories, 1);
    assert_eq!(project.in_progress_stories, 1);
    assert_eq!(project.progress_percent, 33);

    let sprint = project.sprint_status.expect("sprint status");
    assert_eq!(sprint.sprint.as_deref(), Some("costingo"));
    assert_eq!(sprint.start_date.as_deref(), Some("2026-02-01"));

    // Story files stay out of the documentation tree.
    let flat: Vec<&str> = project.file_tree.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(flat, vec!["implementation-artifacts", "planning-artifacts"]);
    assert_eq!(project.docs_folder_name.as_deref(), Some("Docs"));
    assert_eq!(project.docs_tree.len(), 1);
    assert_eq!(project.docs_tree[0].name, "guide.md");
    assert_eq!(project.bmad_files.len(), 5);
}

#[tokio::test]
async fn empty_repository_still_assembles() {
    let source = FakeRepo::new().file("src/main.rs", "fn main() {}\n");
    let project = get_bmad_project(&source, &repo_config())
        .await
        .expect("assemble");

    assert!(project.epics.is_empty());
    assert!(project.stories.is_empty());
    assert!(project.sprint_status.is_none());
    assert_eq!(project.parse_health.total_files, 0);
    assert_eq!(project.total_stories, 0);
    assert_eq!(project.progress_percent, 0);
    assert!(project.file_tree.is_empty());
    assert!(project.docs_tree.is_empty());
}

#[tokio::test]
async fn one_failed_fetch_does_not_abort_the_batch() {
    let source = FakeRepo::new()
        .failing("_bmad-output/implementation-artifacts/1-1-broken.md")
        .file(
            "_bmad-output/implementation-artifacts/1-2-fine.md",
            "# Fine\n",
        );
    let project = get_bmad_project(&source, &repo_config())
        .await
        .expect("assemble");

    assert_eq!(project.parse_health.total_files, 2);
    assert_eq!(project.parse_health.successful_files, 1);
    assert_eq!(project.parse_health.errors.len(), 1);
    let entry = &project.parse_health.errors[0];
    assert_eq!(entry.file, "_bmad-output/implementation-artifacts/1-1-broken.md");
    assert!(entry.error.contains("file unavailable"));
    assert_eq!(entry.content_type, "story");

    assert_eq!(project.stories.len(), 1);
    assert_eq!(project.stories[0].id, "1.2");
}

#[tokio::test]
async fn malformed_sprint_yaml_degrades_to_a_parse_error() {
    let source = FakeRepo::new()
        .file(
            "_bmad-output/implementation-artifacts/sprint-status.yaml",
            "development_status: [broken",
        )
        .file(
            "_bmad-output/implementation-artifacts/1-1-ok.md",
            "# Ok\n\nStatus: done\n",
        );
    let project = get_bmad_project(&source, &repo_config())
        .await
        .expect("assemble");

    assert!(project.sprint_status.is_none());
    assert_eq!(project.parse_health.errors.len(), 1);
    assert_eq!(project.parse_health.errors[0].content_type, "sprint-status");
    assert_eq!(project.stories.len(), 1);
    assert_eq!(project.stories[0].status, StoryStatus::Done);
}

#[tokio::test]
async fn story_with_invalid_frontmatter_is_reported_per_file() {
    let source = FakeRepo::new()
        .file(
            "_bmad-output/implementation-artifacts/1-1-bad.md",
            "---\nstatus: [broken\n---\n# Bad\n",
        )
        .file(
            "_bmad-output/implementation-artifacts/1-2-good.md",
            "# Good\n",
        );
    let project = get_bmad_project(&source, &repo_config())
        .await
        .expect("assemble");

    assert_eq!(project.parse_health.total_files, 2);
    assert_eq!(project.parse_health.errors.len(), 1);
    assert_eq!(project.parse_health.errors[0].content_type, "story");
    assert_eq!(project.stories.len(), 1);
    assert_eq!(project.stories[0].id, "1.2");
}
