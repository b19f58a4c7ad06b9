use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

fn default_branch() -> String {
    "main".to_string()
}

/// One tracked repository reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoConfig {
    pub owner: String,
    pub name: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl RepoConfig {
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    pub fn display_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.name)
    }
}

/// Contents of `bmadscope.toml`: the repositories to track and where to
/// find the access token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BmadscopeConfig {
    /// Environment variable holding the content-host token.
    /// Defaults to GITHUB_TOKEN.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
    #[serde(default)]
    pub repos: Vec<RepoConfig>,
}

impl BmadscopeConfig {
    pub fn find_repo(&self, slug: &str) -> Option<&RepoConfig> {
        self.repos
            .iter()
            .find(|r| r.slug().eq_ignore_ascii_case(slug.trim()))
    }

    pub fn token_env(&self) -> &str {
        self.token_env
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("GITHUB_TOKEN")
    }

    /// Access token from the configured environment variable, if set and
    /// non-empty.
    pub fn resolve_token(&self) -> Option<String> {
        std::env::var(self.token_env())
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join("bmadscope.toml")
}

pub fn load_config(path: &Path) -> Result<BmadscopeConfig, ConfigError> {
    if !path.is_file() {
        return Ok(BmadscopeConfig::default());
    }
    let text = fs::read_to_string(path)?;
    Ok(toml::from_str(&text)?)
}

pub fn save_config(path: &Path, config: &BmadscopeConfig) -> Result<(), ConfigError> {
    let text = toml::to_string_pretty(config)?;
    fs::write(path, text)?;
    Ok(())
}
