//! Changelog document model
//!
//! A changelog is a markdown file with a fixed marker line. Everything above
//! the marker is free-form header; below it, deployments are grouped into
//! date sections, newest section first:
//!
//! ```text
//! # Historique des changements
//!
//! <!--- changes -->
//! ## 02.01.2024
//! <!--- git-0a1b2c -->
//! - **ABC-14**: Add export
//!
//! ## 01.01.2024
//! <!--- git-deadbeef -->
//! - **ABC-12**: Fix login
//!
//! ```
//!
//! Parsing keeps every line verbatim and builds a structural index of date
//! sections and deployment blocks on top of it, so a document written by the
//! updater serializes back byte for byte.

use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

/// Sentinel line that anchors the structured part of the document
pub const CHANGES_MARKER: &str = "<!--- changes -->";

/// Default document title used when initializing a changelog
pub const DEFAULT_TITLE: &str = "Historique des changements";

/// Date format used in section headers (`DD.MM.YYYY`)
pub const DATE_FORMAT: &str = "%d.%m.%Y";

const DATE_HEADER_PREFIX: &str = "## ";
const HASH_PREFIX: &str = "<!--- git-";
const HASH_SUFFIX: &str = " -->";
const ENTRY_PREFIX: &str = "- **";
const ENTRY_SEPARATOR: &str = "**: ";

/// Structural problems that make a document unusable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatProblem {
    #[error("missing '{}' marker line", CHANGES_MARKER)]
    MissingMarker,

    #[error("'{}' marker appears more than once (lines {first} and {second})", CHANGES_MARKER)]
    DuplicateMarker { first: usize, second: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChangelogError {
    #[error("Invalid changelog format: {0}")]
    FormatInvalid(FormatProblem),

    #[error("Invalid deployment hash '{0}': expected a hexadecimal commit hash")]
    InvalidHash(String),
}

impl ChangelogError {
    /// Returns true if the document itself is malformed
    pub fn is_format_invalid(&self) -> bool {
        matches!(self, ChangelogError::FormatInvalid(_))
    }
}

/// One issue line inside a deployment block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueEntry {
    pub code: String,
    pub summary: String,
}

impl IssueEntry {
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
        }
    }

    /// Renders the entry as a single bullet line
    ///
    /// Line breaks inside the summary are flattened to spaces.
    pub fn render(&self) -> String {
        let summary: String = self
            .summary
            .trim()
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        format!("{}{}{}{}", ENTRY_PREFIX, self.code, ENTRY_SEPARATOR, summary)
    }

    /// Parses a bullet line produced by [`IssueEntry::render`]
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.trim_end().strip_prefix(ENTRY_PREFIX)?;
        let (code, summary) = rest.split_once(ENTRY_SEPARATOR)?;
        if code.is_empty() {
            return None;
        }
        Some(Self::new(code, summary))
    }
}

/// Renders a date section header line
pub fn render_date_header(date: NaiveDate) -> String {
    format!("{}{}", DATE_HEADER_PREFIX, date.format(DATE_FORMAT))
}

/// Renders a deployment hash marker line
pub fn render_hash_marker(hash: &str) -> String {
    format!("{}{}{}", HASH_PREFIX, hash, HASH_SUFFIX)
}

/// What a single line means to the parser
#[derive(Debug, PartialEq, Eq)]
enum LineKind<'a> {
    Marker,
    DateHeader(NaiveDate),
    DeploymentHash(&'a str),
    Blank,
    Text,
}

fn classify(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if trimmed == CHANGES_MARKER {
        return LineKind::Marker;
    }
    if let Some(hash) = trimmed
        .strip_prefix(HASH_PREFIX)
        .and_then(|rest| rest.strip_suffix(HASH_SUFFIX))
    {
        if !hash.is_empty() && !hash.contains(char::is_whitespace) {
            return LineKind::DeploymentHash(hash);
        }
    }
    if let Some(label) = trimmed.strip_prefix(DATE_HEADER_PREFIX) {
        if let Ok(date) = NaiveDate::parse_from_str(label.trim(), DATE_FORMAT) {
            return LineKind::DateHeader(date);
        }
    }

    LineKind::Text
}

/// Locates the marker line, failing if it is absent or duplicated
pub fn find_marker_index<S: AsRef<str>>(lines: &[S]) -> Result<usize, ChangelogError> {
    let mut found: Option<usize> = None;

    for (i, line) in lines.iter().enumerate() {
        if classify(line.as_ref()) == LineKind::Marker {
            if let Some(first) = found {
                return Err(ChangelogError::FormatInvalid(FormatProblem::DuplicateMarker {
                    first: first + 1,
                    second: i + 1,
                }));
            }
            found = Some(i);
        }
    }

    found.ok_or(ChangelogError::FormatInvalid(FormatProblem::MissingMarker))
}

/// All issues recorded for one deployment hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentBlock {
    hash: String,
    line: usize,
    end: usize,
    entries: Vec<IssueEntry>,
}

impl DeploymentBlock {
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn entries(&self) -> &[IssueEntry] {
        &self.entries
    }

    /// Index of the hash marker line
    pub fn line(&self) -> usize {
        self.line
    }

    /// Index of the first line after the block, past its blank terminator
    pub fn end(&self) -> usize {
        self.end
    }
}

/// Deployments recorded on one calendar day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateSection {
    date: NaiveDate,
    line: usize,
    blocks: Vec<DeploymentBlock>,
}

impl DateSection {
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Index of the section header line
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn blocks(&self) -> &[DeploymentBlock] {
        &self.blocks
    }

    /// Where a new block goes to land after every existing one
    pub fn append_index(&self) -> usize {
        self.blocks.last().map_or(self.line + 1, DeploymentBlock::end)
    }
}

/// A parsed changelog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogDocument {
    lines: Vec<String>,
    trailing_newline: bool,
    marker: usize,
    /// Blocks between the marker and the first date header
    loose_blocks: Vec<DeploymentBlock>,
    sections: Vec<DateSection>,
}

impl ChangelogDocument {
    /// Parses raw changelog text
    pub fn parse(text: &str) -> Result<Self, ChangelogError> {
        let lines = text.lines().map(str::to_string).collect();
        Self::from_lines(lines, text.ends_with('\n'))
    }

    /// Builds the document model over already split lines
    pub fn from_lines(lines: Vec<String>, trailing_newline: bool) -> Result<Self, ChangelogError> {
        let marker = find_marker_index(&lines)?;
        let mut loose_blocks = Vec::new();
        let mut sections: Vec<DateSection> = Vec::new();

        let mut i = marker + 1;
        while i < lines.len() {
            match classify(&lines[i]) {
                LineKind::DateHeader(date) => {
                    sections.push(DateSection {
                        date,
                        line: i,
                        blocks: Vec::new(),
                    });
                    i += 1;
                }
                LineKind::DeploymentHash(hash) => {
                    let block = parse_block(&lines, i, hash);
                    i = block.end;
                    match sections.last_mut() {
                        Some(section) => section.blocks.push(block),
                        None => loose_blocks.push(block),
                    }
                }
                _ => i += 1,
            }
        }

        Ok(Self {
            lines,
            trailing_newline,
            marker,
            loose_blocks,
            sections,
        })
    }

    /// Creates a document with a title, the marker and an empty body
    pub fn initialize_empty(title: &str) -> Self {
        let lines = vec![
            String::new(),
            format!("# {}", title.trim()),
            String::new(),
            CHANGES_MARKER.to_string(),
        ];

        Self {
            lines,
            trailing_newline: true,
            marker: 3,
            loose_blocks: Vec::new(),
            sections: Vec::new(),
        }
    }

    /// Replaces the whole content, re-validating the structure
    ///
    /// The replaced document always ends with a newline, so a trailing
    /// blank line survives serialization.
    pub fn replace_lines(&mut self, lines: Vec<String>) -> Result<(), ChangelogError> {
        *self = Self::from_lines(lines, true)?;
        Ok(())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn find_marker_index(&self) -> usize {
        self.marker
    }

    /// Date sections in document order (newest first)
    pub fn sections(&self) -> &[DateSection] {
        &self.sections
    }

    /// Returns the section for a given day, if one exists
    pub fn section_for(&self, date: NaiveDate) -> Option<&DateSection> {
        self.sections.iter().find(|s| s.date == date)
    }

    /// Every deployment block in document order
    pub fn deployment_blocks(&self) -> impl Iterator<Item = &DeploymentBlock> {
        self.loose_blocks
            .iter()
            .chain(self.sections.iter().flat_map(|s| s.blocks.iter()))
    }

    /// Hash of the most recent deployment, i.e. the first one below the marker
    pub fn find_first_deployment_hash(&self) -> Option<&str> {
        self.deployment_blocks().next().map(DeploymentBlock::hash)
    }

    /// Returns true if a block for this hash already exists anywhere
    ///
    /// Hex hashes compare case-insensitively.
    pub fn contains_hash(&self, hash: &str) -> bool {
        self.deployment_blocks().any(|b| b.hash.eq_ignore_ascii_case(hash))
    }

    /// Serializes the document back to text
    pub fn to_text(&self) -> String {
        let mut text = self.lines.join("\n");
        if self.trailing_newline {
            text.push('\n');
        }
        text
    }
}

impl fmt::Display for ChangelogDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Reads a block from its hash line up to and including the blank terminator
fn parse_block(lines: &[String], start: usize, hash: &str) -> DeploymentBlock {
    let mut entries = Vec::new();
    let mut j = start + 1;

    while j < lines.len() {
        match classify(&lines[j]) {
            LineKind::Blank => {
                j += 1;
                break;
            }
            LineKind::DateHeader(_) | LineKind::DeploymentHash(_) | LineKind::Marker => break,
            LineKind::Text => {
                if let Some(entry) = IssueEntry::parse(&lines[j]) {
                    entries.push(entry);
                }
                j += 1;
            }
        }
    }

    DeploymentBlock {
        hash: hash.to_string(),
        line: start,
        end: j,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32, m: u32, y: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const SAMPLE: &str = "\
# Historique des changements

Some intro text.

<!--- changes -->
## 02.01.2024
<!--- git-0a1b2c -->
- **ABC-14**: Add export
- **ABC-15**: Tweak export

## 01.01.2024
<!--- git-deadbeef -->
- **ABC-12**: Fix login

<!--- git-cafe01 -->
- **ABC-13**: Fix logout

";

    #[test]
    fn parses_sections_and_blocks() {
        let doc = ChangelogDocument::parse(SAMPLE).unwrap();

        assert_eq!(doc.find_marker_index(), 4);
        assert_eq!(doc.sections().len(), 2);

        let newest = &doc.sections()[0];
        assert_eq!(newest.date(), date(2, 1, 2024));
        assert_eq!(newest.blocks().len(), 1);
        assert_eq!(newest.blocks()[0].hash(), "0a1b2c");
        assert_eq!(
            newest.blocks()[0].entries(),
            &[
                IssueEntry::new("ABC-14", "Add export"),
                IssueEntry::new("ABC-15", "Tweak export"),
            ]
        );

        let older = &doc.sections()[1];
        assert_eq!(older.date(), date(1, 1, 2024));
        let hashes: Vec<_> = older.blocks().iter().map(|b| b.hash()).collect();
        assert_eq!(hashes, vec!["deadbeef", "cafe01"]);
    }

    #[test]
    fn first_deployment_hash_is_most_recent() {
        let doc = ChangelogDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.find_first_deployment_hash(), Some("0a1b2c"));
    }

    #[test]
    fn first_deployment_hash_none_for_empty_body() {
        let doc = ChangelogDocument::initialize_empty(DEFAULT_TITLE);
        assert_eq!(doc.find_first_deployment_hash(), None);
    }

    #[test]
    fn missing_marker_is_format_error() {
        let err = ChangelogDocument::parse("# Changelog\n\n## 01.01.2024\n").unwrap_err();
        assert_eq!(err, ChangelogError::FormatInvalid(FormatProblem::MissingMarker));
        assert!(err.is_format_invalid());
    }

    #[test]
    fn duplicate_marker_is_format_error() {
        let text = format!("{m}\n## 01.01.2024\n{m}\n", m = CHANGES_MARKER);
        let err = ChangelogDocument::parse(&text).unwrap_err();
        assert_eq!(
            err,
            ChangelogError::FormatInvalid(FormatProblem::DuplicateMarker { first: 1, second: 3 })
        );
    }

    #[test]
    fn marker_must_be_whole_line() {
        let text = "see <!--- changes --> inline\n";
        assert!(ChangelogDocument::parse(text).is_err());
    }

    #[test]
    fn serializes_verbatim() {
        let doc = ChangelogDocument::parse(SAMPLE).unwrap();
        assert_eq!(doc.to_text(), SAMPLE);

        let no_newline = "# T\n<!--- changes -->";
        assert_eq!(ChangelogDocument::parse(no_newline).unwrap().to_text(), no_newline);
    }

    #[test]
    fn initialized_document_layout() {
        let doc = ChangelogDocument::initialize_empty("Changes");
        assert_eq!(doc.to_text(), "\n# Changes\n\n<!--- changes -->\n");
        assert_eq!(ChangelogDocument::parse(&doc.to_text()).unwrap(), doc);
    }

    #[test]
    fn blocks_before_first_section_are_tracked() {
        let text = "<!--- changes -->\n<!--- git-abc123 -->\n- **ABC-1**: Thing\n\n## 01.01.2024\n";
        let doc = ChangelogDocument::parse(text).unwrap();

        assert!(doc.contains_hash("abc123"));
        assert!(doc.contains_hash("ABC123"));
        assert_eq!(doc.find_first_deployment_hash(), Some("abc123"));
        assert!(doc.sections()[0].blocks().is_empty());
    }

    #[test]
    fn non_date_headings_are_plain_text() {
        let text = "<!--- changes -->\n## Unreleased\n## 31.02.2024\n";
        let doc = ChangelogDocument::parse(text).unwrap();
        assert!(doc.sections().is_empty());
    }

    #[test]
    fn unterminated_block_stops_at_next_header() {
        let text = "<!--- changes -->\n## 02.01.2024\n<!--- git-aa -->\n- **ABC-1**: One\n## 01.01.2024\n<!--- git-bb -->\n";
        let doc = ChangelogDocument::parse(text).unwrap();

        assert_eq!(doc.sections().len(), 2);
        assert_eq!(doc.sections()[0].blocks()[0].end(), 4);
        assert_eq!(doc.sections()[1].blocks()[0].hash(), "bb");
    }

    #[test]
    fn stray_lines_inside_block_are_kept_but_not_entries() {
        let text = "<!--- changes -->\n## 01.01.2024\n<!--- git-aa -->\n- **ABC-1**: One\nnote by hand\n\n";
        let doc = ChangelogDocument::parse(text).unwrap();
        let block = &doc.sections()[0].blocks()[0];

        assert_eq!(block.entries().len(), 1);
        assert_eq!(block.end(), 6);
        assert_eq!(doc.to_text(), text);
    }

    #[test]
    fn replace_lines_revalidates() {
        let mut doc = ChangelogDocument::initialize_empty(DEFAULT_TITLE);
        let err = doc.replace_lines(vec!["# nothing".to_string()]).unwrap_err();
        assert!(err.is_format_invalid());

        doc.replace_lines(vec![CHANGES_MARKER.to_string(), render_date_header(date(5, 3, 2024))])
            .unwrap();
        assert_eq!(doc.sections()[0].date(), date(5, 3, 2024));
        assert!(doc.to_text().ends_with("## 05.03.2024\n"));
    }

    #[test]
    fn replace_lines_keeps_trailing_blank_line() {
        let mut doc = ChangelogDocument::parse("# T\n<!--- changes -->").unwrap();
        doc.replace_lines(vec![
            CHANGES_MARKER.to_string(),
            render_date_header(date(1, 1, 2024)),
            render_hash_marker("aa"),
            String::new(),
        ])
        .unwrap();

        assert_eq!(ChangelogDocument::parse(&doc.to_text()).unwrap(), doc);
        assert_eq!(doc.sections()[0].blocks()[0].end(), 4);
    }

    #[test]
    fn upper_case_legacy_hash_is_found() {
        let text = "<!--- changes -->\n## 01.01.2024\n<!--- git-DEADBEEF -->\n- **ABC-1**: One\n\n";
        let doc = ChangelogDocument::parse(text).unwrap();

        assert!(doc.contains_hash("deadbeef"));
    }

    #[test]
    fn issue_entry_renders_single_line() {
        let entry = IssueEntry::new("ABC-1", "First line\nsecond line");
        assert_eq!(entry.render(), "- **ABC-1**: First line second line");
        assert_eq!(IssueEntry::parse(&entry.render()).unwrap().summary, "First line second line");
    }

    #[test]
    fn date_header_format() {
        assert_eq!(render_date_header(date(1, 1, 2024)), "## 01.01.2024");
        assert_eq!(render_hash_marker("deadbeef"), "<!--- git-deadbeef -->");
    }
}
