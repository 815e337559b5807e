//! Environment variable interpolation for configured command templates.

use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpolateError {
    #[error("unclosed variable reference: ${{{0}")]
    Unclosed(String),

    #[error("environment variable '{0}' is not set")]
    Missing(String),
}

/// Interpolate `${VAR}` references from the process environment.
pub fn interpolate_env(s: &str) -> Result<String, InterpolateError> {
    interpolate_env_with(s, &BTreeMap::new())
}

/// Interpolate `${VAR}` references, checking `env` before the process environment.
///
/// Text without `${` passes through untouched, so `{input}` and shell
/// parameters like `$1` survive.
///
/// ```
/// use std::collections::BTreeMap;
/// let env = BTreeMap::from([("TOOL".to_string(), "./calc".to_string())]);
/// let cmd = filetest::env::interpolate_env_with("${TOOL} {input}", &env).unwrap();
/// assert_eq!(cmd, "./calc {input}");
/// ```
pub fn interpolate_env_with(
    s: &str,
    env: &BTreeMap<String, String>,
) -> Result<String, InterpolateError> {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(open) = rest.find("${") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find('}') else {
            return Err(InterpolateError::Unclosed(after.to_string()));
        };
        out.push_str(&lookup(&after[..close], env)?);
        rest = &after[close + 1..];
    }
    out.push_str(rest);

    Ok(out)
}

fn lookup(name: &str, env: &BTreeMap<String, String>) -> Result<String, InterpolateError> {
    if let Some(value) = env.get(name) {
        return Ok(value.clone());
    }
    std::env::var(name).map_err(|_| InterpolateError::Missing(name.to_string()))
}
