//! Main CLI application structure

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::deployment::RangeArgs;
use super::output::{Output, OutputFormat};
use super::{changelog_cmd, comment_cmd, issues_cmd};

#[derive(Parser)]
#[command(name = "jira-release")]
#[command(author, version, about = "Deploy-time helper for Jira: changelog generation and deployment comments")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create or update the changelog with the issues being deployed
    Changelog(changelog_cmd::ChangelogArgs),

    /// Comment on the issues being deployed
    Comment(comment_cmd::CommentArgs),

    /// List the issues referenced by the commits being deployed
    Issues(RangeArgs),
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);

    output.verbose("jira-release starting");

    match cli.command {
        Commands::Changelog(args) => {
            output.verbose_ctx(
                "changelog",
                &format!("Range {}..{}, initialize={}", args.range.from, args.range.to, args.initialize),
            );
            changelog_cmd::run(args, &output)?
        }
        Commands::Comment(args) => {
            output.verbose_ctx("comment", &format!("Environment: {}", args.environment));
            comment_cmd::run(args, &output)?
        }
        Commands::Issues(args) => issues_cmd::run(args, &output)?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}
