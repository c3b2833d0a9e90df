//! Compiled `regex` predicate patterns.

use std::fmt;

use regex::Regex;

/// A `regex` rule pattern, compiled once when the rule is read.
///
/// Matching is anchored at the start of the input, so `a|b` behaves as
/// `\A(?:a|b)`. An invalid pattern is kept along with its compile error and
/// reported when the rule is evaluated.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    anchored: Result<Regex, regex::Error>,
}

impl Pattern {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        // The bare pattern must compile on its own; wrapping it could
        // otherwise hide unbalanced groups such as `a)(b`.
        let anchored =
            Regex::new(&source).and_then(|_| Regex::new(&format!(r"\A(?:{source})")));
        Self { source, anchored }
    }

    /// The pattern as written in the rule.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The start-anchored regex, or the error the pattern failed with.
    pub fn anchored(&self) -> Result<&Regex, &regex::Error> {
        self.anchored.as_ref()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl From<&str> for Pattern {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<String> for Pattern {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}
