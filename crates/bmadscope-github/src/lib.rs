//! GitHub-backed [`ContentSource`] for the bmadscope engine.
//!
//! Thin REST client: one call for the recursive tree, one per file for raw
//! content. No retry or caching here; the engine treats every failure as
//! "file unavailable" and degrades per file.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;

use bmadscope_core::source::{ContentSource, SourceError, TreeEntry};

const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("bmadscope/", env!("CARGO_PKG_VERSION"));

pub struct GithubClient {
    http: Client,
    token: Option<String>,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

impl GithubClient {
    pub fn new(token: Option<String>) -> Self {
        Self::with_base(token, DEFAULT_API_BASE)
    }

    /// Point the client at a different API root. Used by tests against a
    /// local stub server.
    pub fn with_base(token: Option<String>, api_base: &str) -> Self {
        GithubClient {
            http: Client::new(),
            token,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn get(&self, url: String, accept: &str) -> RequestBuilder {
        let mut request = self
            .http
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", accept)
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }
}

fn map_status(status: StatusCode, path: &str) -> SourceError {
    match status {
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => SourceError::RateLimited,
        StatusCode::UNAUTHORIZED => SourceError::Unauthorized,
        StatusCode::NOT_FOUND => SourceError::NotFound(path.to_string()),
        status => SourceError::Fetch(format!("unexpected status {status} for {path}")),
    }
}

fn map_transport(err: reqwest::Error) -> SourceError {
    SourceError::Fetch(err.to_string())
}

#[async_trait]
impl ContentSource for GithubClient {
    async fn repo_tree(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Vec<TreeEntry>, SourceError> {
        let url = format!(
            "{}/repos/{owner}/{repo}/git/trees/{branch}?recursive=1",
            self.api_base
        );
        let response = self
            .get(url, "application/vnd.github+json")
            .send()
            .await
            .map_err(map_transport)?;
        if !response.status().is_success() {
            return Err(map_status(response.status(), &format!("{owner}/{repo}")));
        }
        let parsed: TreeResponse = response.json().await.map_err(map_transport)?;
        if parsed.truncated {
            log::warn!("{owner}/{repo}@{branch}: tree listing was truncated by the API");
        }
        Ok(parsed.tree)
    }

    async fn file_content(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        path: &str,
    ) -> Result<String, SourceError> {
        let url = format!(
            "{}/repos/{owner}/{repo}/contents/{path}?ref={branch}",
            self.api_base
        );
        // The raw media type skips the base64 detour of the contents API.
        let response = self
            .get(url, "application/vnd.github.raw+json")
            .send()
            .await
            .map_err(map_transport)?;
        if !response.status().is_success() {
            return Err(map_status(response.status(), path));
        }
        response.text().await.map_err(map_transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_statuses_map_to_rate_limited() {
        assert!(matches!(
            map_status(StatusCode::FORBIDDEN, "p"),
            SourceError::RateLimited
        ));
        assert!(matches!(
            map_status(StatusCode::TOO_MANY_REQUESTS, "p"),
            SourceError::RateLimited
        ));
    }

    #[test]
    fn missing_files_map_to_not_found() {
        let err = map_status(StatusCode::NOT_FOUND, "a/b.md");
        match err {
            SourceError::NotFound(path) => assert_eq!(path, "a/b.md"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn everything_else_is_a_generic_fetch_error() {
        assert!(matches!(
            map_status(StatusCode::INTERNAL_SERVER_ERROR, "p"),
            SourceError::Fetch(_)
        ));
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, "p"),
            SourceError::Unauthorized
        ));
    }

    #[test]
    fn tree_response_reads_github_entry_shapes() {
        let body = r#"{
            "sha": "abc",
            "tree": [
                {"path": "README.md", "type": "blob", "sha": "x"},
                {"path": "docs", "type": "tree", "sha": "y"},
                {"path": "vendored", "type": "commit", "sha": "z"}
            ],
            "truncated": false
        }"#;
        let parsed: TreeResponse = serde_json::from_str(body).expect("parse");
        assert_eq!(parsed.tree.len(), 3);
        assert!(!parsed.truncated);
    }
}
