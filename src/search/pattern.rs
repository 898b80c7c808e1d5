//! Typed wildcard patterns with implicit "contains" semantics.
//!
//! A [`Pattern`] is an ordered list of literal segments. Matching treats the
//! pattern as `*seg1*seg2*...*`: every segment must appear in the haystack, in
//! order, with anything (including nothing) before, between and after them.
//! Store-specific escaping happens only when a pattern is rendered for a
//! backend, see [`Pattern::to_sql_like`].

use std::fmt;

/// Character used by SQL `LIKE` clauses to escape metacharacters.
pub const SQL_LIKE_ESCAPE: char = '\\';

/// A substring pattern made of literal segments separated by wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pattern {
    segments: Vec<String>,
}

impl Pattern {
    /// Single-segment pattern matching `text` anywhere in the haystack.
    pub fn literal(text: impl Into<String>) -> Self {
        Self::from_segments([text.into()])
    }

    /// Builds a pattern from segments, dropping empty ones.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        }
    }

    /// Two-segment pattern splitting `chars` before index `at`: `left*right`.
    pub(crate) fn split_at(chars: &[char], at: usize) -> Self {
        let (left, right) = chars.split_at(at);
        Self::from_segments([left.iter().collect::<String>(), right.iter().collect()])
    }

    /// One segment per character: `*a*b*c*`.
    pub(crate) fn interspersed(chars: &[char]) -> Self {
        Self::from_segments(chars.iter().map(char::to_string))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The literal text when this pattern has exactly one segment.
    pub fn as_literal(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    /// A literal containing whitespace, scored as a phrase.
    pub fn is_phrase(&self) -> bool {
        self.as_literal().is_some_and(|s| s.contains(' '))
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Tests whether every segment occurs in `haystack`, in order.
    ///
    /// Leftmost matching of each segment is sufficient: consuming the earliest
    /// occurrence leaves the longest possible remainder for later segments.
    pub fn is_match(&self, haystack: &str) -> bool {
        let mut rest = haystack;
        for segment in &self.segments {
            match rest.find(segment.as_str()) {
                Some(at) => rest = &rest[at + segment.len()..],
                None => return false,
            }
        }
        true
    }

    /// Renders the pattern as a SQL `LIKE` operand: `%seg1%seg2%`.
    ///
    /// Segments are escaped with [`escape_like`]; the clause must declare
    /// `ESCAPE '\'`.
    pub fn to_sql_like(&self) -> String {
        let mut out = String::from("%");
        for segment in &self.segments {
            out.push_str(&escape_like(segment));
            out.push('%');
        }
        out
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.segments.join("*"))
    }
}

/// Escapes SQL `LIKE` metacharacters (`%`, `_` and the escape character).
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | SQL_LIKE_ESCAPE) {
            out.push(SQL_LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}
