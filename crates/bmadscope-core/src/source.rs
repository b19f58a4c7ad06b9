use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeEntryKind {
    Blob,
    Tree,
    /// Anything else a host may report (submodules, for one).
    #[serde(other)]
    Other,
}

/// One entry of a repository tree listing, as reported by the content host.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: TreeEntryKind,
}

impl TreeEntry {
    pub fn blob(path: &str) -> Self {
        TreeEntry {
            path: path.to_string(),
            kind: TreeEntryKind::Blob,
        }
    }

    pub fn tree(path: &str) -> Self {
        TreeEntry {
            path: path.to_string(),
            kind: TreeEntryKind::Tree,
        }
    }
}

/// Failure taxonomy at the content-source boundary. The engine itself never
/// retries; it records per-file failures and keeps going.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("rate limited by content host")]
    RateLimited,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("authentication required or token rejected")]
    Unauthorized,
    #[error("content fetch failed: {0}")]
    Fetch(String),
}

/// External collaborator that hands the engine repository trees and raw
/// UTF-8 file contents. Retry, backoff, and caching live behind this trait,
/// never inside the engine.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Flat recursive listing of every entry in the repository at `branch`.
    async fn repo_tree(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Vec<TreeEntry>, SourceError>;

    /// Raw text content of one file.
    async fn file_content(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        path: &str,
    ) -> Result<String, SourceError>;
}
