//! Suite configuration.
//!
//! An optional `filetest.yaml` (or `.yml` / `.toml`) in the test root supplies
//! defaults for every run. Command-line flags override it.

use crate::env::{InterpolateError, interpolate_env_with};
use crate::executor::DEFAULT_TIMEOUT;
use crate::loader::DEFAULT_PATTERN;
use crate::runner::DEFAULT_COMMAND;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Suite-level configuration loaded from the test root.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SuiteConfig {
    /// Config format version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Command template; `{input}` is replaced by each test's quoted input.
    /// `${VAR}` references are resolved from `env` and then the process environment.
    #[serde(default)]
    pub command: Option<String>,

    /// Timeout in seconds for each test command.
    #[serde(default)]
    pub timeout: Option<u64>,

    /// File-name glob selecting test files (default: `*.test`).
    #[serde(default)]
    pub pattern: Option<String>,

    /// Only run tests carrying at least one of these tags.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Extra environment variables for executed commands.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

fn default_version() -> u32 {
    1
}

/// Generate the JSON schema for the suite config file.
pub fn generate_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(SuiteConfig)
}

/// Values given on the command line; `None` defers to the suite config.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub command: Option<String>,
    pub timeout: Option<u64>,
    pub pattern: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub command: String,
    pub timeout: Duration,
    pub pattern: String,
    pub tags: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            command: DEFAULT_COMMAND.to_string(),
            timeout: DEFAULT_TIMEOUT,
            pattern: DEFAULT_PATTERN.to_string(),
            tags: Vec::new(),
            env: BTreeMap::new(),
        }
    }
}

impl RunSettings {
    /// Combine flags, suite config, and defaults, in that order of precedence.
    pub fn resolve(suite: Option<&SuiteConfig>, overrides: Overrides) -> Result<Self, InterpolateError> {
        let defaults = Self::default();
        let Some(suite) = suite else {
            return Ok(Self {
                command: overrides.command.unwrap_or(defaults.command),
                timeout: overrides.timeout.map(Duration::from_secs).unwrap_or(defaults.timeout),
                pattern: overrides.pattern.unwrap_or(defaults.pattern),
                tags: overrides.tags.unwrap_or(defaults.tags),
                env: defaults.env,
            });
        };

        let command = match (overrides.command, &suite.command) {
            (Some(cmd), _) => cmd,
            (None, Some(cmd)) => interpolate_env_with(cmd, &suite.env)?,
            (None, None) => defaults.command,
        };

        Ok(Self {
            command,
            timeout: overrides
                .timeout
                .or(suite.timeout)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            pattern: overrides
                .pattern
                .or_else(|| suite.pattern.clone())
                .unwrap_or(defaults.pattern),
            tags: overrides.tags.unwrap_or_else(|| suite.tags.clone()),
            env: suite.env.clone(),
        })
    }
}
