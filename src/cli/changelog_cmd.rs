//! Changelog generation command
//!
//! Decides between initializing and updating the changelog, checks that
//! the claimed remote version matches the last recorded deployment, then
//! records the issues being deployed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Args;
use serde::Serialize;

use super::deployment::{connect, issues_in_deployment, JiraArgs, RangeArgs};
use super::output::Output;
use super::prompt::{Confirm, Prompt};
use crate::domain::{Deployment, IssueExtractor, UpdateMode, UpdateOutcome, DATE_FORMAT};
use crate::storage::{ChangelogStore, Config};
use crate::tracker::{resolve_entries, IssueTracker, TrackerError};
use crate::vcs::{GitLog, VersionControlLog};

#[derive(Args, Debug)]
pub struct ChangelogArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    #[command(flatten)]
    pub jira: JiraArgs,

    /// Changelog path, relative to the git repository
    #[arg(long)]
    pub changelog_path: Option<PathBuf>,

    /// Create or overwrite the changelog file
    #[arg(long)]
    pub initialize: bool,

    /// Title used when initializing
    #[arg(long)]
    pub title: Option<String>,

    /// Deployment date (DD.MM.YYYY or YYYY-MM-DD), defaults to today
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Answer yes to every confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .map_err(|_| format!("invalid date '{}': expected DD.MM.YYYY or YYYY-MM-DD", s))
}

/// Everything the changelog flow needs besides its collaborators
#[derive(Debug, Clone)]
pub struct ChangelogPlan {
    pub prefix: String,
    pub from: String,
    pub to: String,
    pub initialize: bool,
    pub title: String,
    pub date: NaiveDate,
}

/// How a changelog run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChangelogResult {
    Initialized { hash: String, issues: Vec<String> },
    Updated { hash: String, issues: Vec<String> },
    AlreadyRecorded { hash: String },
    Declined,
}

pub fn run(args: ChangelogArgs, output: &Output) -> Result<()> {
    let repo = args.range.git_path.clone();
    let config = Config::load(&repo)?;

    let prefix = config.require_prefix(args.range.prefix.as_deref())?;
    let extractor = IssueExtractor::new(&prefix)?;
    let log = GitLog::open(&repo)?;

    let changelog_path = args
        .changelog_path
        .clone()
        .unwrap_or_else(|| config.project.changelog_path.clone());
    let store = ChangelogStore::in_repository(&repo, &changelog_path);
    output.verbose_ctx("changelog", &format!("Changelog file: {}", store.path().display()));

    let plan = ChangelogPlan {
        prefix,
        from: args.range.from.clone(),
        to: args.range.to.clone(),
        initialize: args.initialize,
        title: args.title.clone().unwrap_or_else(|| config.project.title.clone()),
        date: args.date.unwrap_or_else(|| Local::now().date_naive()),
    };

    let jira = args.jira.resolve(&config);
    let prompt = Prompt::new(args.yes);

    let result = generate(&plan, &log, &extractor, &store, &prompt, || connect(jira), output)?;
    report(&result, &changelog_path, output);
    Ok(())
}

/// Runs the changelog flow against the given collaborators
///
/// The tracker is only built once there are issues to look up, so runs
/// that record nothing never need credentials.
pub fn generate<L, C, T, F>(
    plan: &ChangelogPlan,
    log: &L,
    extractor: &IssueExtractor,
    store: &ChangelogStore,
    prompt: &C,
    tracker: F,
    output: &Output,
) -> Result<ChangelogResult>
where
    L: VersionControlLog,
    C: Confirm,
    T: IssueTracker,
    F: FnOnce() -> Result<T, TrackerError>,
{
    let exists = store.exists();

    let initialize = if plan.initialize {
        if exists
            && !prompt.confirm("A changelog file already exists, do you want to overwrite it?")?
        {
            return Ok(ChangelogResult::Declined);
        }
        true
    } else if !exists {
        if !prompt.confirm("A changelog file was not found. Would you like to initialize it?")? {
            return Ok(ChangelogResult::Declined);
        }
        true
    } else {
        false
    };

    let hash = log
        .resolve(&plan.to)
        .with_context(|| format!("Failed to resolve version to deploy '{}'", plan.to))?;

    let mut baseline = plan.from.clone();

    if !initialize {
        let doc = store.read()?;

        if doc.contains_hash(&hash) {
            output.verbose_ctx("changelog", &format!("{} already recorded, skipping lookups", hash));
            return Ok(ChangelogResult::AlreadyRecorded { hash });
        }

        if let Some(recorded) = doc.find_first_deployment_hash() {
            let claimed = log
                .resolve(&plan.from)
                .with_context(|| format!("Failed to resolve remote version '{}'", plan.from))?;

            if !claimed.eq_ignore_ascii_case(recorded) {
                output.warn(&format!(
                    "The remote version ({}) is different from the last deployment found in {} ({})",
                    plan.from,
                    store.path().display(),
                    recorded
                ));
                if !prompt.confirm(
                    "The changelog could be updated with erroneous information. Proceed anyway?",
                )? {
                    return Ok(ChangelogResult::Declined);
                }
            }

            baseline = recorded.to_string();
        }
    }

    output.verbose_ctx("changelog", &format!("Collecting issues in {}..{}", baseline, plan.to));
    let codes = issues_in_deployment(log, extractor, &baseline, &plan.to)?;
    if codes.is_empty() {
        anyhow::bail!(
            "No {} issues were found in the commits, the changelog was not updated",
            plan.prefix
        );
    }
    output.verbose_ctx("changelog", &format!("Found issues: {}", codes.join(", ")));

    let tracker = tracker().context("Failed to connect to the issue tracker")?;
    let entries = resolve_entries(&tracker, &codes).context("Failed to fetch issue summaries")?;

    let deployment = Deployment::new(hash.clone(), plan.date, entries)?;
    let mode = if initialize {
        UpdateMode::Initialize {
            title: plan.title.clone(),
        }
    } else {
        UpdateMode::Update
    };

    let result = match store.apply(&deployment, &mode)? {
        UpdateOutcome::Applied(_) if initialize => ChangelogResult::Initialized { hash, issues: codes },
        UpdateOutcome::Applied(_) => ChangelogResult::Updated { hash, issues: codes },
        UpdateOutcome::AlreadyApplied => ChangelogResult::AlreadyRecorded { hash },
    };

    Ok(result)
}

fn report(result: &ChangelogResult, changelog_path: &std::path::Path, output: &Output) {
    if output.is_json() {
        output.data(result);
        return;
    }

    let path = changelog_path.display();
    match result {
        ChangelogResult::Initialized { issues, .. } => {
            output.success(&format!("{} was correctly initialized ({} issues).", path, issues.len()))
        }
        ChangelogResult::Updated { issues, .. } => {
            output.success(&format!("{} was updated ({} issues).", path, issues.len()))
        }
        ChangelogResult::AlreadyRecorded { hash } => {
            output.success(&format!("{} already records deployment {}, nothing to do.", path, hash))
        }
        ChangelogResult::Declined => output.success(&format!("{} was not modified.", path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::deployment::fakes::{FakeLog, FakeTracker, ScriptedPrompt};
    use crate::cli::output::OutputFormat;
    use crate::domain::DEFAULT_TITLE;
    use std::fs;
    use tempfile::TempDir;

    const OLD: &str = "1111111111111111111111111111111111111111";
    const NEW: &str = "2222222222222222222222222222222222222222";

    fn plan(initialize: bool) -> ChangelogPlan {
        ChangelogPlan {
            prefix: "ABC".to_string(),
            from: "v1".to_string(),
            to: "HEAD".to_string(),
            initialize,
            title: DEFAULT_TITLE.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    fn output() -> Output {
        Output::new(OutputFormat::Text, false)
    }

    fn extractor() -> IssueExtractor {
        IssueExtractor::new("ABC").unwrap()
    }

    fn tracker() -> FakeTracker {
        FakeTracker::with(&[("ABC-12", "Fix login"), ("ABC-99", "Other")])
    }

    fn log() -> FakeLog {
        FakeLog::default()
            .with_revision("v1", OLD)
            .with_revision("HEAD", NEW)
            .with_revision(OLD, OLD)
            .with_range("v1", "HEAD", &["fix ABC-12 login", "ABC-99 other"])
            .with_range(OLD, "HEAD", &["ABC-12 only since recorded"])
    }

    fn store(dir: &TempDir) -> ChangelogStore {
        ChangelogStore::new(dir.path().join("CHANGELOG.md"))
    }

    fn recorded_changelog(store: &ChangelogStore, hash: &str) {
        let text = format!(
            "\n# {}\n\n<!--- changes -->\n## 31.12.2023\n<!--- git-{} -->\n- **ABC-1**: Earlier\n\n",
            DEFAULT_TITLE, hash
        );
        fs::write(store.path(), text).unwrap();
    }

    #[test]
    fn missing_file_initializes_after_confirmation() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let prompt = ScriptedPrompt::new(&[true]);

        let result = generate(&plan(false), &log(), &extractor(), &store, &prompt, || Ok(tracker()), &output())
            .unwrap();

        assert_eq!(
            result,
            ChangelogResult::Initialized {
                hash: NEW.to_string(),
                issues: vec!["ABC-12".to_string(), "ABC-99".to_string()],
            }
        );
        let doc = store.read().unwrap();
        assert_eq!(doc.find_first_deployment_hash(), Some(NEW));
        assert_eq!(doc.sections()[0].blocks()[0].entries().len(), 2);
    }

    #[test]
    fn missing_file_declined_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let prompt = ScriptedPrompt::new(&[false]);

        let result = generate(&plan(false), &log(), &extractor(), &store, &prompt, || Ok(tracker()), &output())
            .unwrap();

        assert_eq!(result, ChangelogResult::Declined);
        assert!(!store.exists());
    }

    #[test]
    fn initialize_over_existing_file_asks_first() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        recorded_changelog(&store, OLD);
        let before = fs::read_to_string(store.path()).unwrap();
        let prompt = ScriptedPrompt::new(&[false]);

        let result = generate(&plan(true), &log(), &extractor(), &store, &prompt, || Ok(tracker()), &output())
            .unwrap();

        assert_eq!(result, ChangelogResult::Declined);
        assert_eq!(prompt.asked.borrow().len(), 1);
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn update_uses_recorded_baseline() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        recorded_changelog(&store, OLD);
        let log = log();
        let prompt = ScriptedPrompt::new(&[]);

        let result = generate(&plan(false), &log, &extractor(), &store, &prompt, || Ok(tracker()), &output())
            .unwrap();

        assert_eq!(
            result,
            ChangelogResult::Updated {
                hash: NEW.to_string(),
                issues: vec!["ABC-12".to_string()],
            }
        );
        assert!(prompt.asked.borrow().is_empty());
        assert_eq!(*log.requested.borrow(), vec![(OLD.to_string(), "HEAD".to_string())]);

        let doc = store.read().unwrap();
        let dates: Vec<_> = doc.sections().iter().map(|s| s.date()).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            ]
        );
    }

    #[test]
    fn baseline_mismatch_declined_aborts() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let recorded = "3333333333333333333333333333333333333333";
        recorded_changelog(&store, recorded);
        let before = fs::read_to_string(store.path()).unwrap();
        let prompt = ScriptedPrompt::new(&[false]);

        let result = generate(&plan(false), &log(), &extractor(), &store, &prompt, || Ok(tracker()), &output())
            .unwrap();

        assert_eq!(result, ChangelogResult::Declined);
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn baseline_mismatch_accepted_still_uses_recorded_hash() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let recorded = "3333333333333333333333333333333333333333";
        recorded_changelog(&store, recorded);
        let log = log().with_range(recorded, "HEAD", &["ABC-99 since recorded"]);
        let prompt = ScriptedPrompt::new(&[true]);

        let result = generate(&plan(false), &log, &extractor(), &store, &prompt, || Ok(tracker()), &output())
            .unwrap();

        assert!(matches!(result, ChangelogResult::Updated { ref issues, .. } if issues == &["ABC-99"]));
        assert_eq!(*log.requested.borrow(), vec![(recorded.to_string(), "HEAD".to_string())]);
    }

    #[test]
    fn already_recorded_skips_tracker() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        recorded_changelog(&store, NEW);
        let prompt = ScriptedPrompt::new(&[]);

        let result = generate(
            &plan(false),
            &log(),
            &extractor(),
            &store,
            &prompt,
            || -> Result<FakeTracker, TrackerError> { panic!("tracker must not be built") },
            &output(),
        )
        .unwrap();

        assert_eq!(result, ChangelogResult::AlreadyRecorded { hash: NEW.to_string() });
    }

    #[test]
    fn no_issues_is_an_error_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let log = FakeLog::default()
            .with_revision("HEAD", NEW)
            .with_range("v1", "HEAD", &["chore: bump deps"]);
        let prompt = ScriptedPrompt::new(&[true]);

        let err = generate(&plan(false), &log, &extractor(), &store, &prompt, || Ok(tracker()), &output())
            .unwrap_err();

        assert!(err.to_string().contains("No ABC issues were found"));
        assert!(!store.exists());
    }

    #[test]
    fn lookup_failure_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        recorded_changelog(&store, OLD);
        let before = fs::read_to_string(store.path()).unwrap();
        let prompt = ScriptedPrompt::new(&[]);
        let empty_tracker = FakeTracker::default();

        let result = generate(&plan(false), &log(), &extractor(), &store, &prompt, || Ok(empty_tracker), &output());

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn malformed_changelog_is_reported() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(store.path(), "# Changelog without marker\n").unwrap();
        let prompt = ScriptedPrompt::new(&[]);

        let err = generate(&plan(false), &log(), &extractor(), &store, &prompt, || Ok(tracker()), &output())
            .unwrap_err();

        let store_err = err.downcast_ref::<crate::storage::StoreError>().unwrap();
        assert!(store_err.is_format_invalid());
    }

    #[test]
    fn parses_both_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(parse_date("05.03.2024").unwrap(), expected);
        assert_eq!(parse_date("2024-03-05").unwrap(), expected);
        assert!(parse_date("March 5").is_err());
    }
}
