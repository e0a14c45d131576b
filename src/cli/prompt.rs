//! Interactive yes/no confirmation

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

/// Asks the operator before doing something irreversible
pub trait Confirm {
    fn confirm(&self, question: &str) -> Result<bool>;
}

/// Prompts on stderr and reads the answer from stdin
///
/// Only `y`/`Y` counts as yes; an empty answer or closed stdin is a no.
pub struct Prompt {
    assume_yes: bool,
}

impl Prompt {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Confirm for Prompt {
    fn confirm(&self, question: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }

        let mut stderr = io::stderr();
        write!(stderr, "{} [y/N]: ", question).context("Failed to write prompt")?;
        stderr.flush().context("Failed to flush prompt")?;

        let mut answer = String::new();
        io::stdin()
            .lock()
            .read_line(&mut answer)
            .context("Failed to read answer")?;

        Ok(is_yes(&answer))
    }
}

fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}
