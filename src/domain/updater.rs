//! Changelog merge algorithm
//!
//! Inserts one deployment block into a parsed document. The hash of the
//! deployed commit is the idempotency key: a hash already present anywhere
//! in the document turns the update into a no-op.
//!
//! Placement rules:
//! - a section for the deployment date gets the block appended after its
//!   last existing block, so blocks within a day read in call order
//! - otherwise a new section header is inserted right below the marker,
//!   keeping sections newest-first

use chrono::NaiveDate;

use super::changelog::{
    render_date_header, render_hash_marker, ChangelogDocument, ChangelogError, IssueEntry,
};

/// A deployment to record: commit hash, day and resolved issues
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    hash: String,
    date: NaiveDate,
    entries: Vec<IssueEntry>,
}

impl Deployment {
    /// Creates a deployment, validating the hash token
    pub fn new(
        hash: impl Into<String>,
        date: NaiveDate,
        entries: Vec<IssueEntry>,
    ) -> Result<Self, ChangelogError> {
        let hash = hash.into();
        if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ChangelogError::InvalidHash(hash));
        }

        Ok(Self {
            hash: hash.to_ascii_lowercase(),
            date,
            entries,
        })
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn entries(&self) -> &[IssueEntry] {
        &self.entries
    }

    /// Hash line, one line per issue, blank terminator
    fn render_block(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.entries.len() + 2);
        lines.push(render_hash_marker(&self.hash));
        lines.extend(self.entries.iter().map(IssueEntry::render));
        lines.push(String::new());
        lines
    }
}

/// Result of applying a deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The block was inserted; carries the new document
    Applied(ChangelogDocument),

    /// The hash was already recorded, nothing changed
    AlreadyApplied,
}

impl UpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, UpdateOutcome::Applied(_))
    }
}

/// Whether the update starts from the current document or a fresh one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateMode {
    Update,
    Initialize { title: String },
}

/// Computes the document with the deployment recorded
pub fn apply_deployment(
    doc: &ChangelogDocument,
    deployment: &Deployment,
) -> Result<UpdateOutcome, ChangelogError> {
    if doc.contains_hash(deployment.hash()) {
        return Ok(UpdateOutcome::AlreadyApplied);
    }

    let mut lines = doc.lines().to_vec();

    let mut block = deployment.render_block();

    let insert_at = match doc.section_for(deployment.date()) {
        Some(section) => {
            let at = section.append_index();
            // A previous block missing its blank terminator gets one
            if !section.blocks().is_empty() && !lines[at - 1].trim().is_empty() {
                block.insert(0, String::new());
            }
            at
        }
        None => {
            let header_at = doc.find_marker_index() + 1;
            lines.insert(header_at, render_date_header(deployment.date()));
            header_at + 1
        }
    };

    lines.splice(insert_at..insert_at, block);

    let mut updated = doc.clone();
    updated.replace_lines(lines)?;
    Ok(UpdateOutcome::Applied(updated))
}

/// Parses `current` (or starts empty when initializing) and applies the deployment
pub fn update_text(
    current: &str,
    deployment: &Deployment,
    mode: &UpdateMode,
) -> Result<UpdateOutcome, ChangelogError> {
    let doc = match mode {
        UpdateMode::Update => ChangelogDocument::parse(current)?,
        UpdateMode::Initialize { title } => ChangelogDocument::initialize_empty(title),
    };
    apply_deployment(&doc, deployment)
}
