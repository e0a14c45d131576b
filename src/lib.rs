//! jira-release - deploy-time helper for teams tracking work in Jira
//!
//! Given the version live on a server and the version about to be
//! deployed, it finds the issue codes referenced by the commits in between,
//! records them with their summaries in a dated changelog, and can comment
//! on each issue once it is deployed.

pub mod domain;
pub mod storage;
pub mod tracker;
pub mod vcs;
pub mod cli;

pub use domain::{ChangelogDocument, ChangelogError, Deployment, IssueEntry, IssueExtractor, UpdateOutcome};
