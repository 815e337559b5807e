//! Pass/fail aggregation over a run.

use crate::runner::TestResult;
use serde::Serialize;
use std::time::Duration;

/// Counts derived from a sequence of results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_results(results: &[TestResult<'_>]) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
        }
    }

    /// True when nothing failed. An empty run counts as success here;
    /// callers decide whether running zero tests is acceptable.
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Sum of execution times.
pub fn total_time(results: &[TestResult<'_>]) -> Duration {
    results.iter().map(|r| r.execution_time).sum()
}
