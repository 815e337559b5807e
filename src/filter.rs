//! Selection of test cases after parsing.
//!
//! Filters work on the parser's output so parsing itself stays pure.

use crate::case::TestCase;

/// Keep cases carrying at least one of `tags`. An empty `tags` keeps everything.
pub fn filter_by_tags<S: AsRef<str>>(cases: Vec<TestCase>, tags: &[S]) -> Vec<TestCase> {
    if tags.is_empty() {
        return cases;
    }
    cases
        .into_iter()
        .filter(|case| tags.iter().any(|tag| case.has_tag(tag.as_ref())))
        .collect()
}

/// Keep cases whose name contains `pattern` (substring match).
pub fn filter_by_name(cases: Vec<TestCase>, pattern: &str) -> Vec<TestCase> {
    cases
        .into_iter()
        .filter(|case| case.name.contains(pattern))
        .collect()
}

/// Split a comma-separated tag list as given on the command line.
pub fn parse_tag_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}
