//! Test execution engine.
//!
//! Runs each test case through a [`CommandExecutor`] and judges the output.
//! Failures are reported in the [`TestResult`], never returned as errors.

use crate::case::TestCase;
use crate::compare::compare;
use crate::executor::{
    CommandExecutor, DEFAULT_TIMEOUT, ExecError, ShellExecutor, render_command,
};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Command template used when none is configured.
pub const DEFAULT_COMMAND: &str = "echo {input}";

/// How a single execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The command exited and its output was compared.
    Completed,
    /// The command exceeded the timeout and was killed.
    TimedOut,
    /// The command could not be started or waited on.
    LaunchFailed,
    /// The command's output was not valid UTF-8.
    DecodeFailed,
}

impl From<&ExecError> for RunStatus {
    fn from(err: &ExecError) -> Self {
        match err {
            ExecError::Launch(_) | ExecError::Wait(_) => RunStatus::LaunchFailed,
            ExecError::Timeout { .. } => RunStatus::TimedOut,
            ExecError::Decode { .. } => RunStatus::DecodeFailed,
        }
    }
}

/// Result of running a single test case.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult<'a> {
    #[serde(rename = "test")]
    pub case: &'a TestCase,
    pub passed: bool,
    /// Captured standard output, trimmed.
    pub actual_output: String,
    /// Set only when execution itself failed.
    pub error_message: String,
    #[serde(serialize_with = "serialize_duration")]
    pub execution_time: Duration,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl TestResult<'_> {
    /// Whether the failure came from running the command rather than comparing output.
    pub fn is_execution_failure(&self) -> bool {
        self.status != RunStatus::Completed
    }
}

fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Executes test cases against a command template.
#[derive(Debug, Clone)]
pub struct TestRunner<E = ShellExecutor> {
    template: String,
    timeout: Duration,
    executor: E,
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND)
    }
}

impl TestRunner {
    /// Runner for `template` using the host shell and the default timeout.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            timeout: DEFAULT_TIMEOUT,
            executor: ShellExecutor::new(),
        }
    }
}

impl<E: CommandExecutor> TestRunner<E> {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_executor<F: CommandExecutor>(self, executor: F) -> TestRunner<F> {
        TestRunner {
            template: self.template,
            timeout: self.timeout,
            executor,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The command line that would be executed for `case`.
    pub fn command_for(&self, case: &TestCase) -> String {
        render_command(&self.template, &case.input_data, self.executor.dialect())
    }

    /// Run one test case.
    pub fn run<'a>(&self, case: &'a TestCase) -> TestResult<'a> {
        let command_line = self.command_for(case);
        debug!(test = %case.name, command = %command_line, "running test");

        let start = Instant::now();
        let outcome = self.executor.execute(&command_line, self.timeout);
        let execution_time = start.elapsed();

        let result = match outcome {
            Ok(output) => {
                let actual_output = output.stdout.trim().to_string();
                let passed = compare(&case.expected_output, &actual_output, case.mode());
                TestResult {
                    case,
                    passed,
                    actual_output,
                    error_message: String::new(),
                    execution_time,
                    status: RunStatus::Completed,
                    exit_code: output.exit_code,
                }
            }
            Err(e) => TestResult {
                case,
                passed: false,
                actual_output: e.partial_output().to_string(),
                error_message: e.to_string(),
                execution_time,
                status: RunStatus::from(&e),
                exit_code: match e {
                    ExecError::Decode { exit_code, .. } => exit_code,
                    _ => None,
                },
            },
        };

        info!(
            test = %case.name,
            passed = result.passed,
            status = ?result.status,
            secs = result.execution_time.as_secs_f64(),
            "test finished"
        );
        result
    }

    /// Run every case sequentially; results follow input order.
    pub fn run_all<'a>(&self, cases: &'a [TestCase]) -> Vec<TestResult<'a>> {
        cases.iter().map(|case| self.run(case)).collect()
    }
}

/// Run `case` against `template` with the host shell and default timeout.
pub fn run<'a>(case: &'a TestCase, template: &str) -> TestResult<'a> {
    TestRunner::new(template).run(case)
}
