//! jira-release - deploy-time changelog and Jira comments

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = jira_release::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
