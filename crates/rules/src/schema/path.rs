//! Dotted field paths with numeric indices and `*` wildcards.

use std::fmt;

/// One token of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Plain mapping key (or a key looked up across a sequence of mappings).
    Key(String),
    /// Digit-only segment. Always treated as a sequence index.
    Index(usize),
    /// `*`: fan-out over a sequence.
    Wildcard,
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if raw == "*" {
            Segment::Wildcard
        } else if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            // Indices too large for usize can never be in bounds.
            Segment::Index(raw.parse().unwrap_or(usize::MAX))
        } else {
            Segment::Key(raw.to_string())
        }
    }

    /// The segment as a mapping key, for callers that only walk objects.
    pub fn as_key(&self) -> String {
        match self {
            Segment::Key(k) => k.clone(),
            Segment::Index(i) => i.to_string(),
            Segment::Wildcard => "*".to_string(),
        }
    }
}

/// A parsed path expression such as `ordinary_level_exams.*.subjects`.
///
/// The empty path addresses the whole record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Self {
        let segments = if raw.is_empty() {
            Vec::new()
        } else {
            raw.split('.').map(Segment::parse).collect()
        };
        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn has_wildcard(&self) -> bool {
        self.segments.contains(&Segment::Wildcard)
    }

    /// Split around the first wildcard: `(prefix, suffix)`, wildcard excluded.
    pub fn split_at_wildcard(&self) -> Option<(&[Segment], &[Segment])> {
        let pos = self.segments.iter().position(|s| *s == Segment::Wildcard)?;
        Some((&self.segments[..pos], &self.segments[pos + 1..]))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for FieldPath {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}
