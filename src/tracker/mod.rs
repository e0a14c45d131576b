//! Issue tracker access
//!
//! The changelog only needs an issue's summary; the deploy comment command
//! also posts comments. [`JiraClient`] talks to Jira's REST API; tests use
//! in-memory implementations of [`IssueTracker`].

mod jira;

use thiserror::Error;

use crate::domain::IssueEntry;

pub use jira::{JiraClient, JiraCredentials};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Issue {0} not found")]
    NotFound(String),

    #[error("Issue tracker rejected the credentials")]
    Unauthorized,

    #[error("Issue tracker returned HTTP {status} for {code}")]
    Http { status: u16, code: String },

    #[error("Issue tracker unreachable: {0}")]
    Unreachable(String),

    #[error("Unexpected response from issue tracker: {0}")]
    InvalidResponse(String),

    #[error("Missing issue tracker settings: {}", .0.join(", "))]
    MissingCredentials(Vec<String>),
}

/// Client for the issue tracker holding the deployed issues
pub trait IssueTracker {
    /// Returns the one-line summary of an issue
    fn summary(&self, code: &str) -> Result<String, TrackerError>;

    /// Posts a comment on an issue
    fn add_comment(&self, code: &str, body: &str) -> Result<(), TrackerError>;
}

impl<T: IssueTracker + ?Sized> IssueTracker for &T {
    fn summary(&self, code: &str) -> Result<String, TrackerError> {
        (**self).summary(code)
    }

    fn add_comment(&self, code: &str, body: &str) -> Result<(), TrackerError> {
        (**self).add_comment(code, body)
    }
}

/// Looks up every code in order, giving up on the first failure
pub fn resolve_entries<T, S>(tracker: &T, codes: &[S]) -> Result<Vec<IssueEntry>, TrackerError>
where
    T: IssueTracker + ?Sized,
    S: AsRef<str>,
{
    codes
        .iter()
        .map(|code| {
            let code = code.as_ref();
            tracker
                .summary(code)
                .map(|summary| IssueEntry::new(code, summary))
        })
        .collect()
}

/// Comment posted on an issue once it reaches an environment
pub fn deployment_comment(code: &str, environment: &str) -> String {
    format!("{code} was deployed in the {environment} environment")
}
