//! # Command-Line Interface
//!
//! User-facing commands and output formatting. This is the orchestration
//! layer: it loads configuration, asks for confirmation and wires git and
//! Jira into the changelog core.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `changelog` | Initialize or update the changelog for a deployment |
//! | `comment` | Post a "deployed to <env>" comment on each deployed issue |
//! | `issues` | List the issue codes found in the deployed commits |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output on stderr:
//! ```bash
//! jira-release --verbose issues --prefix ABC --from v1.2.0
//! ```

mod app;
mod changelog_cmd;
mod comment_cmd;
mod deployment;
mod issues_cmd;
mod output;
mod prompt;

pub use app::{run, Cli, Commands};
pub use changelog_cmd::{generate, ChangelogPlan, ChangelogResult};
pub use comment_cmd::{post_comments, CommentReport};
pub use deployment::issues_in_deployment;
pub use output::{Output, OutputFormat};
pub use prompt::{Confirm, Prompt};
