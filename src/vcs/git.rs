//! Git-backed commit log
//!
//! Shells out to the `git` binary in the target repository.

use std::path::PathBuf;
use std::process::Command;

use thiserror::Error;

use super::VersionControlLog;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("Not a git repository: {}", .0.display())]
    NotGitRepository(PathBuf),

    #[error("Unknown revision '{0}'")]
    UnknownRevision(String),

    #[error("Failed to execute git command: {0}")]
    CommandError(String),

    #[error("Git command output was not valid UTF-8")]
    InvalidUtf8,
}

/// Commit log of a local git repository
#[derive(Debug, Clone)]
pub struct GitLog {
    repo: PathBuf,
}

impl GitLog {
    /// Opens the repository at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, GitError> {
        let repo = path.into();
        if !repo.is_dir() {
            return Err(GitError::NotADirectory(repo));
        }
        Ok(Self { repo })
    }

    /// Runs git with the given arguments and returns stdout
    fn git(&self, args: &[&str]) -> Result<String, GitError> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo)
            // Clear GIT_DIR to avoid being affected by git hooks environment
            .env_remove("GIT_DIR")
            .env_remove("GIT_WORK_TREE")
            .output()
            .map_err(|e| GitError::CommandError(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("not a git repository") {
                return Err(GitError::NotGitRepository(self.repo.clone()));
            }
            return Err(GitError::CommandError(stderr.trim().to_string()));
        }

        String::from_utf8(output.stdout).map_err(|_| GitError::InvalidUtf8)
    }
}

impl VersionControlLog for GitLog {
    fn subjects(&self, from: &str, to: &str) -> Result<Vec<String>, GitError> {
        let range = format!("{from}..{to}");
        let stdout = self.git(&["log", "--no-color", "--oneline", &range])?;

        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn resolve(&self, rev: &str) -> Result<String, GitError> {
        let spec = format!("{rev}^{{commit}}");
        let hash = self
            .git(&["rev-parse", "--verify", "--quiet", &spec])
            .map_err(|e| match e {
                GitError::CommandError(_) => GitError::UnknownRevision(rev.to_string()),
                other => other,
            })?;

        let hash = hash.trim();
        if hash.is_empty() {
            return Err(GitError::UnknownRevision(rev.to_string()));
        }
        Ok(hash.to_string())
    }
}
