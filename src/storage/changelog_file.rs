//! Changelog file storage
//!
//! The changelog is read whole, updated in memory and rewritten whole.
//! Writes go to a sibling temp file that is then renamed over the target,
//! so a failed update never leaves a truncated changelog behind.
//!
//! There is no locking: two runs against the same file at once may lose
//! one of the updates.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::{
    apply_deployment, ChangelogDocument, ChangelogError, Deployment, UpdateMode, UpdateOutcome,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Changelog not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ChangelogError,
    },

    #[error("Failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    /// Returns true if the changelog exists but is malformed
    pub fn is_format_invalid(&self) -> bool {
        matches!(self, StoreError::Invalid { source, .. } if source.is_format_invalid())
    }

    fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A changelog file on disk
#[derive(Debug, Clone)]
pub struct ChangelogStore {
    path: PathBuf,
}

impl ChangelogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for a changelog path relative to a repository
    pub fn in_repository(repo: &Path, changelog_path: &Path) -> Self {
        Self::new(repo.join(changelog_path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Reads and parses the changelog
    pub fn read(&self) -> Result<ChangelogDocument, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(self.path.clone()))
            }
            Err(e) => return Err(StoreError::io("read", &self.path, e)),
        };

        ChangelogDocument::parse(&content).map_err(|source| StoreError::Invalid {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes the document atomically (temp file + rename)
    pub fn write(&self, doc: &ChangelogDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io("create directory", parent, e))?;
        }

        let temp_path = self.temp_path();

        if let Err(e) = fs::write(&temp_path, doc.to_text()) {
            let _ = fs::remove_file(&temp_path);
            return Err(StoreError::io("write", &temp_path, e));
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StoreError::io("replace", &self.path, e)
        })
    }

    /// Writes an empty changelog, replacing any existing file
    pub fn initialize(&self, title: &str) -> Result<ChangelogDocument, StoreError> {
        let doc = ChangelogDocument::initialize_empty(title);
        self.write(&doc)?;
        Ok(doc)
    }

    /// Records a deployment with one full read-modify-write
    ///
    /// Nothing is written when the hash is already present or when the
    /// current file is malformed.
    pub fn apply(
        &self,
        deployment: &Deployment,
        mode: &UpdateMode,
    ) -> Result<UpdateOutcome, StoreError> {
        let doc = match mode {
            UpdateMode::Update => self.read()?,
            UpdateMode::Initialize { title } => ChangelogDocument::initialize_empty(title),
        };

        let outcome = apply_deployment(&doc, deployment).map_err(|source| StoreError::Invalid {
            path: self.path.clone(),
            source,
        })?;

        if let UpdateOutcome::Applied(updated) = &outcome {
            self.write(updated)?;
        }

        Ok(outcome)
    }
}
