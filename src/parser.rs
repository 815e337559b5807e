//! Test file parser.
//!
//! Turns the plain-text block format into [`TestCase`] records:
//!
//! ```text
//! ### TEST: Addition
//! DESCRIPTION: Test basic addition
//! TYPE: exact
//! TAGS: math, basic
//! INPUT:
//! 2 + 2
//! EXPECTED:
//! 4
//! ```
//!
//! Parsing is total: malformed sections are skipped or partially interpreted,
//! never reported as errors.

use crate::case::{CompareMode, SourceLocation, TestCase};
use std::path::Path;
use tracing::{debug, trace};

/// Marks the start of each test section. The test name follows on the same line.
pub const SECTION_DELIMITER: &str = "### TEST:";

const DESCRIPTION_KEYWORD: &str = "DESCRIPTION:";
const INPUT_KEYWORD: &str = "INPUT:";
const EXPECTED_KEYWORD: &str = "EXPECTED:";
const TYPE_KEYWORD: &str = "TYPE:";
const TAGS_KEYWORD: &str = "TAGS:";

/// Parse the text of one test file.
///
/// `source` is recorded on every case for diagnostics; the file is not read.
/// Text before the first delimiter is ignored, and a file without delimiters
/// yields no cases.
pub fn parse(text: &str, source: impl AsRef<Path>) -> Vec<TestCase> {
    let source = source.as_ref();
    let starts: Vec<usize> = text
        .match_indices(SECTION_DELIMITER)
        .map(|(idx, _)| idx)
        .collect();

    let mut cases = Vec::with_capacity(starts.len());
    let mut line = 1;
    let mut counted_to = 0;
    for (i, &start) in starts.iter().enumerate() {
        let body_start = start + SECTION_DELIMITER.len();
        let body_end = starts.get(i + 1).copied().unwrap_or(text.len());
        line += text[counted_to..start].matches('\n').count();
        counted_to = start;
        let location = SourceLocation::new(source).with_line(line);

        match parse_section(&text[body_start..body_end], location) {
            Some(case) => cases.push(case),
            None => debug!(file = %source.display(), line, "skipping test section without a name"),
        }
    }
    cases
}

/// Parse one section (the text after a delimiter, up to the next one).
///
/// The name is the first non-blank line. Returns `None` for a blank section.
fn parse_section(section: &str, source: SourceLocation) -> Option<TestCase> {
    let mut lines = section.trim().lines();
    let name = lines.next().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return None;
    }

    let mut builder = SectionBuilder::default();
    for line in lines {
        builder.feed(line);
    }
    let case = builder.finish(name, source);
    debug!(
        name = %case.name,
        test_type = %case.test_type,
        input = %case.input_data,
        expected = %case.expected_output,
        "parsed test case"
    );
    Some(case)
}

/// The field block currently collecting lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Block {
    #[default]
    None,
    Description,
    Input,
    Expected,
}

/// One line of a section, classified by its leading keyword.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    /// Opens a field block; carries any inline text after the keyword.
    Field(Block, &'a str),
    Type(&'a str),
    Tags(&'a str),
    Text(&'a str),
    Blank,
}

fn classify(raw: &str) -> Line<'_> {
    let line = raw.trim();
    if line.is_empty() {
        return Line::Blank;
    }
    let fields = [
        (DESCRIPTION_KEYWORD, Block::Description),
        (INPUT_KEYWORD, Block::Input),
        (EXPECTED_KEYWORD, Block::Expected),
    ];
    for (keyword, block) in fields {
        if let Some(rest) = line.strip_prefix(keyword) {
            return Line::Field(block, rest.trim());
        }
    }
    if let Some(rest) = line.strip_prefix(TYPE_KEYWORD) {
        Line::Type(rest)
    } else if let Some(rest) = line.strip_prefix(TAGS_KEYWORD) {
        Line::Tags(rest)
    } else {
        Line::Text(line)
    }
}

/// Accumulates the fields of a section as lines are fed through it.
#[derive(Debug, Default)]
struct SectionBuilder {
    block: Block,
    buffer: Vec<String>,
    description: String,
    input_data: String,
    expected_output: String,
    test_type: Option<String>,
    tags: Vec<String>,
}

impl SectionBuilder {
    fn feed(&mut self, raw: &str) {
        let line = classify(raw);
        trace!(?line, block = ?self.block, "section line");
        match line {
            Line::Field(block, inline) => {
                self.flush();
                self.block = block;
                if !inline.is_empty() {
                    self.buffer.push(inline.to_string());
                }
            }
            Line::Type(value) => self.test_type = Some(value.trim().to_lowercase()),
            Line::Tags(value) => self.tags = split_tags(value),
            Line::Text(text) => {
                if self.block != Block::None {
                    self.buffer.push(text.to_string());
                }
            }
            Line::Blank => {}
        }
    }

    /// Move the buffered lines into the field owned by the current block.
    fn flush(&mut self) {
        let text = self.buffer.join("\n").trim().to_string();
        self.buffer.clear();
        match self.block {
            Block::None => {}
            Block::Description => self.description = text,
            Block::Input => self.input_data = text,
            Block::Expected => self.expected_output = text,
        }
    }

    fn finish(mut self, name: &str, source: SourceLocation) -> TestCase {
        self.flush();
        TestCase {
            name: name.to_string(),
            description: self.description,
            input_data: self.input_data,
            expected_output: self.expected_output,
            test_type: self
                .test_type
                .unwrap_or_else(|| CompareMode::DEFAULT_TYPE.to_string()),
            source,
            tags: self.tags,
        }
    }
}

/// Split a `TAGS:` value on commas, dropping blanks and repeats.
fn split_tags(value: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in value.split(',').map(str::trim) {
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}
