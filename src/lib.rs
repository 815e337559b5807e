//! File-based test harness.
//!
//! Test cases are written in plain-text files:
//!
//! ```text
//! ### TEST: Addition
//! TYPE: exact
//! INPUT:
//! 2 + 2
//! EXPECTED:
//! 4
//! ```
//!
//! [`parser::parse`] turns such text into [`TestCase`]s, and
//! [`runner::TestRunner`] runs each one through an external command whose
//! template contains an `{input}` placeholder, then judges the output with
//! [`compare::compare`].

pub mod case;
pub mod compare;
pub mod config;
pub mod env;
pub mod executor;
pub mod filter;
pub mod loader;
pub mod parser;
pub mod report;
pub mod runner;
pub mod summary;

pub use case::{CompareMode, SourceLocation, TestCase};
pub use runner::{RunStatus, TestResult, TestRunner};
pub use summary::Summary;
