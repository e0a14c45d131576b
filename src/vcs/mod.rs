//! Version control access
//!
//! The changelog flow only needs two things from version control: the
//! commit subjects in a range and the full hash of a revision. Both sit
//! behind [`VersionControlLog`] so the orchestration can be driven by a
//! fake in tests.

mod git;

pub use git::{GitError, GitLog};

/// Read-only view of a repository's history
pub trait VersionControlLog {
    /// Commit subject lines for `from..to`, newest first
    fn subjects(&self, from: &str, to: &str) -> Result<Vec<String>, GitError>;

    /// Full commit hash for a revision (hash, tag, branch or `HEAD`)
    fn resolve(&self, rev: &str) -> Result<String, GitError>;
}
