//! Issue code extraction from commit subjects
//!
//! A commit subject references an issue by its tracker code, e.g.
//! `fix ABC-12 login`. Only the first code on a line is picked up; a
//! subject mentioning two issues contributes just the first one.

use std::collections::HashSet;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid issue prefix '{0}': expected an alphabetic token such as 'ABC'")]
    InvalidPrefix(String),

    #[error("Failed to build issue pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Finds issue codes of the form `<prefix>-<digits>` in commit subjects
#[derive(Debug, Clone)]
pub struct IssueExtractor {
    pattern: Regex,
}

impl IssueExtractor {
    /// Creates an extractor for the given prefix
    ///
    /// Both `ABC` and `ABC-` are accepted. The dash between prefix and
    /// number is optional when matching, so `ABC12` is picked up too.
    pub fn new(prefix: &str) -> Result<Self, ExtractError> {
        let token = prefix.trim().trim_end_matches('-');
        if token.is_empty() || !token.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ExtractError::InvalidPrefix(prefix.to_string()));
        }

        let pattern = Regex::new(&format!(r"{}-?\d+", regex::escape(token)))?;
        Ok(Self { pattern })
    }

    /// Returns the first issue code in a single subject line
    pub fn first_match<'a>(&self, subject: &'a str) -> Option<&'a str> {
        self.pattern.find(subject).map(|m| m.as_str())
    }

    /// Returns the distinct issue codes referenced by the subjects
    ///
    /// The set carries no ordering; callers that display it sort first.
    pub fn extract<I, S>(&self, subjects: I) -> HashSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        subjects
            .into_iter()
            .filter_map(|subject| self.first_match(subject.as_ref()).map(str::to_string))
            .collect()
    }
}
