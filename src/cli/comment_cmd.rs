//! Deployment comment command

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use super::deployment::{connect, issues_in_deployment, JiraArgs, RangeArgs};
use super::output::Output;
use super::prompt::{Confirm, Prompt};
use crate::domain::IssueExtractor;
use crate::storage::Config;
use crate::tracker::{deployment_comment, IssueTracker, TrackerError};
use crate::vcs::{GitLog, VersionControlLog};

#[derive(Args, Debug)]
pub struct CommentArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    #[command(flatten)]
    pub jira: JiraArgs,

    /// Environment the issues were deployed to
    #[arg(long, short = 'e')]
    pub environment: String,

    /// Comment on every issue without asking
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct CommentReport {
    pub commented: Vec<String>,
    pub skipped: Vec<String>,
}

pub fn run(args: CommentArgs, output: &Output) -> Result<()> {
    let repo = args.range.git_path.clone();
    let config = Config::load(&repo)?;
    let prefix = config.require_prefix(args.range.prefix.as_deref())?;
    let extractor = IssueExtractor::new(&prefix)?;
    let log = GitLog::open(&repo)?;
    let jira = args.jira.resolve(&config);
    let prompt = Prompt::new(args.yes);

    let report = post_comments(
        &log,
        &extractor,
        &args.range.from,
        &args.range.to,
        &args.environment,
        &prompt,
        || connect(jira),
        output,
    )?;

    if report.commented.is_empty() && report.skipped.is_empty() {
        output.success("No issues found in this deployment");
    } else if output.is_json() {
        output.data(&report);
    } else {
        output.success(&format!(
            "Commented on {} issue(s), skipped {}",
            report.commented.len(),
            report.skipped.len()
        ));
    }
    Ok(())
}

/// Asks about each deployed issue and comments on the confirmed ones
#[allow(clippy::too_many_arguments)]
pub fn post_comments<L, C, T, F>(
    log: &L,
    extractor: &IssueExtractor,
    from: &str,
    to: &str,
    environment: &str,
    prompt: &C,
    tracker: F,
    output: &Output,
) -> Result<CommentReport>
where
    L: VersionControlLog,
    C: Confirm,
    T: IssueTracker,
    F: FnOnce() -> Result<T, TrackerError>,
{
    let codes = issues_in_deployment(log, extractor, from, to)?;
    if codes.is_empty() {
        return Ok(CommentReport::default());
    }

    let tracker = tracker().context("Failed to connect to the issue tracker")?;
    let mut report = CommentReport::default();

    for code in codes {
        let question = format!(
            "Do you want to comment about the deployment of {} to {} on the issue?",
            code, environment
        );
        if !prompt.confirm(&question)? {
            report.skipped.push(code);
            continue;
        }

        tracker
            .add_comment(&code, &deployment_comment(&code, environment))
            .with_context(|| format!("Failed to comment on {}", code))?;
        output.verbose_ctx("comment", &format!("Commented on {}", code));
        report.commented.push(code);
    }

    Ok(report)
}
