//! Glob matching of fully-qualified function names.
//!
//! `*` matches any run of characters (path separators included), `?` exactly
//! one character, everything else matches itself. Patterns are anchored at
//! both ends, so a pattern without wildcards is a literal equality test.

use regex::RegexSet;

use crate::domain::PatternError;

/// Ordered glob patterns compiled once into a single [`RegexSet`].
#[derive(Debug, Clone)]
pub struct FilterSet {
    patterns: Vec<String>,
    compiled: RegexSet,
}

impl FilterSet {
    /// Compile `patterns`.
    ///
    /// # Errors
    /// Returns an error if the compiled set exceeds the regex size limits.
    pub fn new<I, S>(patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let compiled = RegexSet::new(patterns.iter().map(|p| glob_to_regex(p)))
            .map_err(|source| PatternError::Compile { patterns: patterns.join(", "), source })?;
        Ok(Self { patterns, compiled })
    }

    /// A set that matches nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self { patterns: Vec::new(), compiled: RegexSet::empty() }
    }

    /// Whether `name` matches any pattern of the set.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.compiled.is_match(name)
    }

    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for FilterSet {
    fn default() -> Self {
        Self::empty()
    }
}

/// Whether `name` matches any pattern of `patterns`.
#[must_use]
pub fn matches(patterns: &FilterSet, name: &str) -> bool {
    patterns.matches(name)
}

/// Translate one glob into an anchored regular expression.
#[must_use]
pub fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2 + 6);
    out.push_str("(?s)^");
    let mut buf = [0u8; 4];
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(patterns: &[&str]) -> FilterSet {
        FilterSet::new(patterns.iter().copied()).unwrap()
    }

    #[test]
    fn test_star_crosses_separators() {
        let includes = set(&["acme::*"]);
        assert!(includes.matches("acme::Service::compute"));
        assert!(includes.matches("acme::internal::Foo::bar"));
        assert!(!includes.matches("other::acme::f"));
    }

    #[test]
    fn test_question_mark_is_single_character() {
        let patterns = set(&["acme::v?::run"]);
        assert!(patterns.matches("acme::v1::run"));
        assert!(!patterns.matches("acme::v10::run"));
        assert!(!patterns.matches("acme::v::run"));
    }

    #[test]
    fn test_literal_pattern_is_equality() {
        let patterns = set(&["com.acme.Service.compute"]);
        assert!(patterns.matches("com.acme.Service.compute"));
        // `.` is literal, not "any character".
        assert!(!patterns.matches("comXacme.Service.compute"));
        assert!(!patterns.matches("com.acme.Service.compute2"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let patterns = set(&["acme::<impl Foo>::f(x)+[y]"]);
        assert!(patterns.matches("acme::<impl Foo>::f(x)+[y]"));
        assert!(!patterns.matches("acme::<impl Foo>::fxx[y]"));
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        assert!(!FilterSet::empty().matches(""));
        assert!(!set(&[]).matches("anything"));
        assert!(FilterSet::default().is_empty());
    }

    #[test]
    fn test_any_pattern_matches() {
        let patterns = set(&["a::*", "b::exact"]);
        assert!(matches(&patterns, "a::x"));
        assert!(matches(&patterns, "b::exact"));
        assert!(!matches(&patterns, "b::exact::more"));
        assert_eq!(patterns.patterns().len(), 2);
    }

    #[test]
    fn test_star_matches_empty_run() {
        assert!(set(&["acme::*"]).matches("acme::"));
        assert!(set(&["*"]).matches(""));
    }
}
