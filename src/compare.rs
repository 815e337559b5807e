//! Output comparison.
//!
//! Pure functions judging expected vs. actual output under a [`CompareMode`].

use crate::case::CompareMode;
use serde_json::{Number, Value};
use tracing::warn;

/// Compare `expected` against `actual` under `mode`.
///
/// Both sides are trimmed first. A mismatch, an invalid regex, and unparseable
/// JSON all return `false`.
pub fn compare(expected: &str, actual: &str, mode: CompareMode) -> bool {
    let expected = expected.trim();
    let actual = actual.trim();

    match mode {
        CompareMode::Exact => expected == actual,
        // Expected is a fragment of the real output, not the other way around.
        CompareMode::Contains => actual.contains(expected),
        CompareMode::Regex => regex_search(expected, actual),
        CompareMode::Json => json_equal(expected, actual),
    }
}

/// Compare using a raw `TYPE:` value; unknown types compare as `exact`.
pub fn compare_as(expected: &str, actual: &str, test_type: &str) -> bool {
    compare(expected, actual, CompareMode::from_type(test_type))
}

fn regex_search(pattern: &str, actual: &str) -> bool {
    match regex::Regex::new(pattern) {
        Ok(re) => re.is_match(actual),
        Err(e) => {
            warn!(pattern, error = %e, "invalid regex in expected output");
            false
        }
    }
}

fn json_equal(expected: &str, actual: &str) -> bool {
    let (Ok(expected), Ok(actual)) = (
        serde_json::from_str::<Value>(expected),
        serde_json::from_str::<Value>(actual),
    ) else {
        return false;
    };
    values_equal(&expected, &actual)
}

/// Deep equality where numbers compare by value, so `1` equals `1.0`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(key, x)| y.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Integers compare exactly; an integer equals a float only when the float
/// holds that exact integral value.
fn numbers_equal(x: &Number, y: &Number) -> bool {
    match (as_integer(x), as_integer(y)) {
        (Some(x), Some(y)) => x == y,
        (Some(i), None) => float_is_integer(y.as_f64(), i),
        (None, Some(i)) => float_is_integer(x.as_f64(), i),
        (None, None) => x.as_f64() == y.as_f64(),
    }
}

fn as_integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

fn float_is_integer(f: Option<f64>, i: i128) -> bool {
    // 2^127 bounds the range where `as i128` is exact for integral floats.
    const LIMIT: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;
    f.is_some_and(|f| f.fract() == 0.0 && f.abs() < LIMIT && f as i128 == i)
}
