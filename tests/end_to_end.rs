//! Parse-then-run scenarios against an in-memory calculator.

use filetest::executor::{CommandExecutor, CommandOutput, ExecError, ShellDialect};
use filetest::parser::parse;
use filetest::{RunStatus, Summary, TestRunner};
use std::time::Duration;

const MATH_FILE: &str = "\
Notes before the first test are ignored.

### TEST: Addition
TYPE: exact
INPUT:
2 + 2
EXPECTED:
4

### TEST:

### TEST: Division
DESCRIPTION: Test division with decimal result
TYPE: contains
TAGS: math, decimal
INPUT:
10 / 3
EXPECTED:
3.3
";

/// Evaluates `a <op> b` from a `calc '<expr>'` command line, like a tiny `eval`.
struct Calculator;

impl Calculator {
    fn eval(expr: &str) -> Option<String> {
        let mut parts = expr.split_whitespace();
        let a: f64 = parts.next()?.parse().ok()?;
        let op = parts.next()?;
        let b: f64 = parts.next()?.parse().ok()?;
        let value = match op {
            "+" => a + b,
            "-" => a - b,
            "*" => a * b,
            "/" => a / b,
            _ => return None,
        };
        if op != "/" && value.fract() == 0.0 {
            Some(format!("{}", value as i64))
        } else {
            Some(format!("{value}"))
        }
    }
}

impl CommandExecutor for Calculator {
    fn execute(&self, command_line: &str, _timeout: Duration) -> Result<CommandOutput, ExecError> {
        let expr = command_line
            .strip_prefix("calc '")
            .and_then(|rest| rest.strip_suffix('\''))
            .unwrap_or_default();
        let stdout = Calculator::eval(expr).unwrap_or_else(|| expr.to_string());
        Ok(CommandOutput {
            stdout: format!("{stdout}\n"),
            exit_code: Some(0),
        })
    }

    fn dialect(&self) -> ShellDialect {
        ShellDialect::Posix
    }
}

/// Always prints the same line, whatever the input.
struct Constant(&'static str);

impl CommandExecutor for Constant {
    fn execute(&self, _command_line: &str, _timeout: Duration) -> Result<CommandOutput, ExecError> {
        Ok(CommandOutput {
            stdout: self.0.to_string(),
            exit_code: Some(0),
        })
    }
}

#[test]
fn parses_two_cases_around_a_nameless_section() {
    let cases = parse(MATH_FILE, "math.test");
    let names: Vec<_> = cases.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Addition", "Division"]);
    assert_eq!(cases[1].tags, vec!["math", "decimal"]);
    assert_eq!(cases[1].description, "Test division with decimal result");
}

#[test]
fn calculator_passes_every_case() {
    let cases = parse(MATH_FILE, "math.test");
    let runner = TestRunner::new("calc {input}").with_executor(Calculator);
    let results = runner.run_all(&cases);

    assert_eq!(results[0].actual_output, "4");
    assert!(results[0].passed);
    assert_eq!(results[1].actual_output, "3.3333333333333335");
    assert!(results[1].passed);
    assert_eq!(
        Summary::from_results(&results),
        Summary {
            total: 2,
            passed: 2,
            failed: 0
        }
    );
}

#[test]
fn wrong_output_is_a_plain_mismatch() {
    let cases = parse(MATH_FILE, "math.test");
    let runner = TestRunner::new("calc {input}").with_executor(Constant("5\n"));
    let result = runner.run(&cases[0]);

    assert!(!result.passed);
    assert_eq!(result.case.expected_output, "4");
    assert_eq!(result.actual_output, "5");
    assert_eq!(result.error_message, "");
    assert_eq!(result.status, RunStatus::Completed);
}

#[test]
fn every_failure_is_explained() {
    let cases = parse(MATH_FILE, "math.test");
    let runner = TestRunner::new("calc {input}").with_executor(Constant("nope"));
    for result in runner.run_all(&cases) {
        assert!(!result.passed);
        let mismatch = !filetest::compare::compare(
            &result.case.expected_output,
            &result.actual_output,
            result.case.mode(),
        );
        assert!(mismatch || !result.error_message.is_empty());
    }
}
