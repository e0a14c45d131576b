//! Jira REST client
//!
//! Uses the v2 REST API with basic authentication:
//! - `GET  /rest/api/2/issue/{key}?fields=summary`
//! - `POST /rest/api/2/issue/{key}/comment`

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::Deserialize;

use super::{IssueTracker, TrackerError};
use crate::storage::JiraConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolved connection settings
#[derive(Clone)]
pub struct JiraCredentials {
    pub url: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for JiraCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraCredentials")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl TryFrom<JiraConfig> for JiraCredentials {
    type Error = TrackerError;

    fn try_from(config: JiraConfig) -> Result<Self, Self::Error> {
        let mut missing = Vec::new();
        if config.url.is_none() {
            missing.push("JIRA_URL".to_string());
        }
        if config.username.is_none() {
            missing.push("JIRA_USERNAME".to_string());
        }
        if config.password.is_none() {
            missing.push("JIRA_PASSWORD".to_string());
        }

        match (config.url, config.username, config.password) {
            (Some(url), Some(username), Some(password)) => Ok(Self {
                url,
                username,
                password,
            }),
            _ => Err(TrackerError::MissingCredentials(missing)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IssueResponse {
    fields: IssueFields,
}

#[derive(Debug, Deserialize)]
struct IssueFields {
    summary: String,
}

/// Blocking Jira client
pub struct JiraClient {
    http: Client,
    base_url: String,
    credentials: JiraCredentials,
}

impl JiraClient {
    pub fn new(credentials: JiraCredentials) -> Result<Self, TrackerError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TrackerError::Unreachable(e.to_string()))?;

        Ok(Self {
            http,
            base_url: credentials.url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn issue_url(&self, code: &str) -> String {
        format!("{}/rest/api/2/issue/{}", self.base_url, code)
    }

    /// Maps non-success statuses to tracker errors
    fn check(response: Response, code: &str) -> Result<Response, TrackerError> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(TrackerError::NotFound(code.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(TrackerError::Unauthorized),
            status => Err(TrackerError::Http {
                status: status.as_u16(),
                code: code.to_string(),
            }),
        }
    }
}

impl IssueTracker for JiraClient {
    fn summary(&self, code: &str) -> Result<String, TrackerError> {
        let response = self
            .http
            .get(self.issue_url(code))
            .query(&[("fields", "summary")])
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .send()
            .map_err(|e| TrackerError::Unreachable(e.to_string()))?;

        let issue: IssueResponse = Self::check(response, code)?
            .json()
            .map_err(|e| TrackerError::InvalidResponse(e.to_string()))?;

        Ok(issue.fields.summary)
    }

    fn add_comment(&self, code: &str, body: &str) -> Result<(), TrackerError> {
        let response = self
            .http
            .post(format!("{}/comment", self.issue_url(code)))
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .json(&serde_json::json!({ "body": body }))
            .send()
            .map_err(|e| TrackerError::Unreachable(e.to_string()))?;

        Self::check(response, code)?;
        Ok(())
    }
}
