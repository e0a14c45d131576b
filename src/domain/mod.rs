//! Domain models for jira-release
//!
//! Contains the changelog model, the merge algorithm and issue extraction,
//! without any I/O concerns.

mod changelog;
mod issue;
mod updater;

pub use changelog::{
    find_marker_index, render_date_header, render_hash_marker, ChangelogDocument, ChangelogError,
    DateSection, DeploymentBlock, FormatProblem, IssueEntry, CHANGES_MARKER, DATE_FORMAT,
    DEFAULT_TITLE,
};
pub use issue::{ExtractError, IssueExtractor};
pub use updater::{apply_deployment, update_text, Deployment, UpdateMode, UpdateOutcome};
