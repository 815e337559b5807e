//! Test file loader.
//!
//! Finds test files on disk, reads them, and loads the suite config.

use crate::case::TestCase;
use crate::config::SuiteConfig;
use crate::parser;
use globset::{Glob, GlobMatcher};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File-name glob used when none is configured.
pub const DEFAULT_PATTERN: &str = "*.test";

/// Suite config file names, in lookup order.
pub const SUITE_CONFIG_FILENAMES: [&str; 3] = ["filetest.yaml", "filetest.yml", "filetest.toml"];

/// Error type for loading operations.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid TOML in {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid file pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("unsupported config format: {} (expected .yaml, .yml, or .toml)", .0.display())]
    UnsupportedFormat(PathBuf),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> LoadError + '_ {
    move |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Read and parse one test file.
///
/// Only an unreadable file is an error; malformed sections are skipped by the parser.
pub fn parse_file(path: &Path) -> Result<Vec<TestCase>, LoadError> {
    let contents = std::fs::read_to_string(path).map_err(io_error(path))?;
    let cases = parser::parse(&contents, path);
    debug!(file = %path.display(), cases = cases.len(), "parsed test file");
    Ok(cases)
}

/// Load a suite config file by extension.
pub fn load_config_file(path: &Path) -> Result<SuiteConfig, LoadError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let contents = std::fs::read_to_string(path).map_err(io_error(path))?;

    match ext {
        "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|source| LoadError::Yaml {
            path: path.to_path_buf(),
            source,
        }),
        "toml" => toml::from_str(&contents).map_err(|source| LoadError::Toml {
            path: path.to_path_buf(),
            source,
        }),
        _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Load suite configuration from a directory.
///
/// Returns `None` if no config file exists, `Err` if one exists but is invalid.
pub fn load_suite_config(dir: &Path) -> Result<Option<SuiteConfig>, LoadError> {
    for name in SUITE_CONFIG_FILENAMES {
        let config_path = dir.join(name);
        if config_path.is_file() {
            debug!(path = %config_path.display(), "loading suite config");
            return load_config_file(&config_path).map(Some);
        }
    }
    Ok(None)
}

/// Find test files under `path` whose file name matches `pattern`.
///
/// A file path is returned as-is regardless of the pattern. Results are sorted.
pub fn find_test_files(path: &Path, pattern: &str) -> Result<Vec<PathBuf>, LoadError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let matcher = Glob::new(pattern)
        .map_err(|source| LoadError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?
        .compile_matcher();

    let mut files = Vec::new();
    collect_files_recursive(path, &matcher, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_files_recursive(
    dir: &Path,
    matcher: &GlobMatcher,
    files: &mut Vec<PathBuf>,
) -> Result<(), LoadError> {
    for entry in std::fs::read_dir(dir).map_err(io_error(dir))? {
        let path = entry.map_err(io_error(dir))?.path();

        if path.is_dir() {
            collect_files_recursive(&path, matcher, files)?;
        } else if let Some(name) = path.file_name() {
            if SUITE_CONFIG_FILENAMES.iter().any(|c| name == *c) {
                continue;
            }
            if matcher.is_match(name) {
                files.push(path);
            }
        }
    }
    Ok(())
}
