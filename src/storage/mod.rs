//! # Storage Layer
//!
//! Persistence for the changelog and configuration.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Changelog | Markdown with a `<!--- changes -->` marker | `CHANGELOG.md` (configurable) |
//! | Project config | TOML | `jira-release.toml` at the repository root |
//! | Global config | TOML | `~/.config/jira-release/config.toml` |
//!
//! ## Write Safety
//!
//! - The changelog is rewritten whole on every update
//! - Writes are atomic (temp file + rename)
//! - There is no locking; concurrent runs on one file are not supported
//!
//! ## Key Types
//!
//! - [`ChangelogStore`] - Read, initialize and update a changelog file
//! - [`Config`] - Project and global configuration

mod changelog_file;
mod config;

pub use changelog_file::{ChangelogStore, StoreError};
pub use config::{Config, ConfigError, GlobalConfig, JiraConfig, ProjectConfig, PROJECT_CONFIG_FILE};
