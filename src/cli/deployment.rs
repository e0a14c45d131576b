//! Arguments and helpers shared by the deployment commands

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::domain::IssueExtractor;
use crate::storage::{Config, JiraConfig};
use crate::tracker::{JiraClient, JiraCredentials, TrackerError};
use crate::vcs::VersionControlLog;

/// The commit range being deployed
#[derive(Args, Debug, Clone)]
pub struct RangeArgs {
    /// Issue code prefix (e.g. ABC for ABC-123)
    #[arg(long, env = "JIRA_PREFIX")]
    pub prefix: Option<String>,

    /// Version currently live on the remote server
    #[arg(long = "from", visible_alias = "remote-version")]
    pub from: String,

    /// Version to be deployed
    #[arg(long = "to", visible_alias = "to-deploy-version", default_value = "HEAD")]
    pub to: String,

    /// Path of the local git repository
    #[arg(long, default_value = ".")]
    pub git_path: PathBuf,
}

/// Jira connection flags; unset values fall back to the config files
#[derive(Args, Debug, Clone, Default)]
pub struct JiraArgs {
    /// Jira base URL
    #[arg(long = "jira-url", env = "JIRA_URL")]
    pub url: Option<String>,

    /// Jira username
    #[arg(long = "jira-username", env = "JIRA_USERNAME")]
    pub username: Option<String>,

    /// Jira password or API token
    #[arg(long = "jira-password", env = "JIRA_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl JiraArgs {
    /// Merges flags over the configured settings
    pub fn resolve(&self, config: &Config) -> JiraConfig {
        JiraConfig {
            url: self.url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
        .or(&config.jira())
    }
}

/// Builds a Jira client from resolved settings
pub fn connect(settings: JiraConfig) -> Result<JiraClient, TrackerError> {
    JiraClient::new(JiraCredentials::try_from(settings)?)
}

/// Distinct issue codes referenced by the commits in `from..to`, sorted
pub fn issues_in_deployment<L: VersionControlLog + ?Sized>(
    log: &L,
    extractor: &IssueExtractor,
    from: &str,
    to: &str,
) -> Result<Vec<String>> {
    let subjects = log
        .subjects(from, to)
        .with_context(|| format!("Failed to read commits in {from}..{to}"))?;

    let mut codes: Vec<String> = extractor.extract(&subjects).into_iter().collect();
    codes.sort();
    Ok(codes)
}
