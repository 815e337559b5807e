//! Result rendering for the command line.
//!
//! Everything here consumes plain [`TestResult`] data and returns text or JSON;
//! printing is left to the caller.

use crate::runner::{RunStatus, TestResult};
use crate::summary::{Summary, total_time};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write as _;
use std::path::Path;

/// Longest expected/actual excerpt shown in the human report.
const EXCERPT_CHARS: usize = 100;

/// Human-readable report with a ✓/✗ line per test.
///
/// Failures always show details; `verbose` shows them for passing tests too.
pub fn render_human(results: &[TestResult<'_>], verbose: bool) -> String {
    let mut out = String::new();
    let mut current_file: Option<&Path> = None;

    for result in results {
        let case = result.case;
        if current_file != Some(case.source.path.as_path()) {
            current_file = Some(case.source.path.as_path());
            let _ = writeln!(out, "\n{}", case.source.path.display());
        }

        let mark = if result.passed { "✓" } else { "✗" };
        let _ = writeln!(
            out,
            "  {mark} {} ({:.3}s)",
            case.name,
            result.execution_time.as_secs_f64()
        );

        if verbose || !result.passed {
            let _ = writeln!(out, "    file: {}", case.source);
            if !case.description.is_empty() {
                let _ = writeln!(out, "    description: {}", case.description);
            }
            if !result.passed {
                let _ = writeln!(out, "    type: {}", case.mode());
                let _ = writeln!(out, "    expected: {}", excerpt(&case.expected_output));
                let _ = writeln!(out, "    actual:   {}", excerpt(&result.actual_output));
                if !result.error_message.is_empty() {
                    let _ = writeln!(out, "    error: {}", result.error_message);
                }
            }
        }
    }

    let summary = Summary::from_results(results);
    let _ = writeln!(
        out,
        "\nTotal: {} | Passed: {} | Failed: {}",
        summary.total, summary.passed, summary.failed
    );
    out
}

fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

/// Machine-readable report: timestamp, summary counts, and every result.
pub fn render_json(results: &[TestResult<'_>], timestamp: DateTime<Utc>) -> serde_json::Value {
    serde_json::json!({
        "timestamp": timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        "summary": Summary::from_results(results),
        "results": results,
    })
}

/// JUnit XML with one `<testsuite>` per source file, in first-seen order.
pub fn render_junit(results: &[TestResult<'_>], timestamp: DateTime<Utc>) -> String {
    let mut groups: Vec<(&Path, Vec<&TestResult<'_>>)> = Vec::new();
    for result in results {
        let path = result.case.source.path.as_path();
        match groups.iter_mut().find(|(p, _)| *p == path) {
            Some((_, group)) => group.push(result),
            None => groups.push((path, vec![result])),
        }
    }

    let summary = Summary::from_results(results);
    let errors = results.iter().filter(|r| r.is_execution_failure()).count();
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        xml,
        "<testsuites tests=\"{}\" failures=\"{}\" errors=\"{errors}\" time=\"{:.3}\" timestamp=\"{}\">",
        summary.total,
        summary.failed - errors,
        total_time(results).as_secs_f64(),
        timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    );

    for (path, group) in &groups {
        let errors = group.iter().filter(|r| r.is_execution_failure()).count();
        let failures = group.iter().filter(|r| !r.passed).count() - errors;
        let time: f64 = group.iter().map(|r| r.execution_time.as_secs_f64()).sum();
        let _ = writeln!(
            xml,
            "  <testsuite name=\"{}\" tests=\"{}\" failures=\"{failures}\" errors=\"{errors}\" time=\"{time:.3}\">",
            escape_xml(&path.display().to_string()),
            group.len()
        );

        for result in group {
            let _ = writeln!(
                xml,
                "    <testcase name=\"{}\" classname=\"{}\" time=\"{:.3}\">",
                escape_xml(&result.case.name),
                escape_xml(&path.display().to_string()),
                result.execution_time.as_secs_f64()
            );

            if result.is_execution_failure() {
                let _ = writeln!(
                    xml,
                    "      <error message=\"{}\" type=\"{}\"/>",
                    escape_xml(&result.error_message),
                    status_name(result.status)
                );
            } else if !result.passed {
                let _ = writeln!(
                    xml,
                    "      <failure message=\"output did not match ({})\">",
                    result.case.mode()
                );
                let _ = writeln!(
                    xml,
                    "expected: {}\nactual: {}",
                    escape_xml(&result.case.expected_output),
                    escape_xml(&result.actual_output)
                );
                xml.push_str("      </failure>\n");
            }

            if !result.actual_output.is_empty() {
                let _ = writeln!(
                    xml,
                    "      <system-out>{}</system-out>",
                    escape_xml(&result.actual_output)
                );
            }

            xml.push_str("    </testcase>\n");
        }

        xml.push_str("  </testsuite>\n");
    }

    xml.push_str("</testsuites>\n");
    xml
}

fn status_name(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Completed => "completed",
        RunStatus::TimedOut => "timed_out",
        RunStatus::LaunchFailed => "launch_failed",
        RunStatus::DecodeFailed => "decode_failed",
    }
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
