//! Configuration handling for jira-release
//!
//! Configuration is stored in `jira-release.toml` at the repository root
//! (project) and `~/.config/jira-release/config.toml` (global). Command-line
//! flags and environment variables win over both; the CLI layer applies
//! them on top of what is loaded here.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::DEFAULT_TITLE;

/// Name of the project configuration file
pub const PROJECT_CONFIG_FILE: &str = "jira-release.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Jira connection settings
///
/// The password is accepted here for completeness, but the environment
/// (`JIRA_PASSWORD`) is the expected place for it.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct JiraConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl JiraConfig {
    /// Fills unset fields from `fallback`
    pub fn or(self, fallback: &JiraConfig) -> JiraConfig {
        JiraConfig {
            url: self.url.or_else(|| fallback.url.clone()),
            username: self.username.or_else(|| fallback.username.clone()),
            password: self.password.or_else(|| fallback.password.clone()),
        }
    }
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Issue code prefix, e.g. `ABC`
    pub prefix: Option<String>,

    /// Changelog path relative to the repository root
    pub changelog_path: PathBuf,

    /// Title written when a changelog is initialized
    pub title: String,

    /// Per-project Jira overrides
    pub jira: JiraConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            prefix: None,
            changelog_path: PathBuf::from("CHANGELOG.md"),
            title: DEFAULT_TITLE.to_string(),
            jira: JiraConfig::default(),
        }
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct GlobalConfig {
    pub jira: JiraConfig,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
}

impl Config {
    /// Loads configuration for the repository at `repo`
    pub fn load(repo: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(repo)?;

        Ok(Self { project, global })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "jira-release", "jira-release")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads project configuration from a repository root
    fn load_project_config(repo: &Path) -> Result<ProjectConfig> {
        let config_path = repo.join(PROJECT_CONFIG_FILE);

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")
    }

    /// Jira settings with project values taking precedence over global ones
    pub fn jira(&self) -> JiraConfig {
        self.project.jira.clone().or(&self.global.jira)
    }

    /// Returns the issue prefix, preferring an explicit one
    pub fn require_prefix(&self, explicit: Option<&str>) -> Result<String, ConfigError> {
        explicit
            .map(str::to_string)
            .or_else(|| self.project.prefix.clone())
            .ok_or_else(|| ConfigError::Missing("issue prefix (--prefix or JIRA_PREFIX)".to_string()))
    }
}
