//! Test case model.
//!
//! A [`TestCase`] is produced once by the parser and is read-only afterward.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Where a test case was declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    /// File the case came from.
    pub path: PathBuf,
    /// 1-based line of the `### TEST:` delimiter, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl SourceLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            line: None,
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{line}", self.path.display()),
            None => write!(f, "{}", self.path.display()),
        }
    }
}

/// A single test case extracted from a test file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    /// Name taken from the `### TEST:` line. Never empty.
    pub name: String,
    /// Free-form description, empty when absent.
    pub description: String,
    /// Data substituted into the command template.
    pub input_data: String,
    /// Output the command is expected to produce.
    pub expected_output: String,
    /// Comparison mode as written in the file, lower-cased.
    ///
    /// Unknown values are kept verbatim; see [`TestCase::mode`].
    pub test_type: String,
    pub source: SourceLocation,
    pub tags: Vec<String>,
}

impl TestCase {
    /// The comparison mode used when judging this case.
    pub fn mode(&self) -> CompareMode {
        CompareMode::from_type(&self.test_type)
    }

    /// Whether the case carries the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// The algorithm used to judge expected vs. actual output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareMode {
    /// String equality after trimming.
    #[default]
    Exact,
    /// Expected is a substring of actual.
    Contains,
    /// Expected is a pattern searched for anywhere in actual.
    Regex,
    /// Both sides parse as JSON and are structurally equal.
    Json,
}

impl CompareMode {
    /// Name used for [`CompareMode::Exact`] when `TYPE:` is omitted.
    pub const DEFAULT_TYPE: &'static str = "exact";

    /// Interpret a `TYPE:` value. Anything unrecognized compares as `exact`.
    pub fn from_type(test_type: &str) -> Self {
        match test_type.trim().to_ascii_lowercase().as_str() {
            "contains" => CompareMode::Contains,
            "regex" => CompareMode::Regex,
            "json" => CompareMode::Json,
            "exact" => CompareMode::Exact,
            other => {
                debug!(test_type = other, "unknown test type, comparing as exact");
                CompareMode::Exact
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompareMode::Exact => "exact",
            CompareMode::Contains => "contains",
            CompareMode::Regex => "regex",
            CompareMode::Json => "json",
        }
    }
}

impl fmt::Display for CompareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
