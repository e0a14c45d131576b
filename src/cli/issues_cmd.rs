//! Lists the issues referenced by a deployment

use anyhow::Result;

use super::deployment::{issues_in_deployment, RangeArgs};
use super::output::Output;
use crate::domain::IssueExtractor;
use crate::storage::Config;
use crate::vcs::GitLog;

pub fn run(args: RangeArgs, output: &Output) -> Result<()> {
    let config = Config::load(&args.git_path)?;
    let prefix = config.require_prefix(args.prefix.as_deref())?;
    let extractor = IssueExtractor::new(&prefix)?;
    let log = GitLog::open(&args.git_path)?;

    output.verbose_ctx("issues", &format!("Scanning {}..{} for {} issues", args.from, args.to, prefix));
    let codes = issues_in_deployment(&log, &extractor, &args.from, &args.to)?;

    if output.is_json() {
        output.data(&serde_json::json!({ "issues": codes }));
    } else if codes.is_empty() {
        println!("No {} issues found in this deployment", prefix);
    } else {
        for code in &codes {
            println!("{}", code);
        }
    }

    Ok(())
}
