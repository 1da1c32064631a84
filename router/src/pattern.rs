//! Route pattern parsing.
//!
//! A pattern string such as `"remote add :name :url"` splits on whitespace.
//! The first word is the root and only selects the candidate group; the
//! remaining words form the matching sequence of [`Segment`]s.

use std::fmt;

use crate::error::{ConfigError, Result};

/// Placeholder every capture collapses to in the normalized form.
pub const CAPTURE_PLACEHOLDER: &str = ":";

/// One word of a route pattern after the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the token exactly.
    Literal(String),
    /// Accepts any token and records it under this name.
    Capture(String),
}

impl Segment {
    fn parse(word: &str, capture_prefix: char) -> Self {
        match word.strip_prefix(capture_prefix) {
            Some(name) if !name.is_empty() => Segment::Capture(name.to_string()),
            _ => Segment::Literal(word.to_string()),
        }
    }
}

/// A parsed route pattern.
///
/// # Examples
///
/// ```
/// use cmdln_router::{Pattern, Segment};
///
/// let p = Pattern::parse("remote add :name :url", ':').unwrap();
/// assert_eq!(p.root(), "remote");
/// assert_eq!(p.len(), 3);
/// assert_eq!(p.segments()[0], Segment::Literal("add".into()));
/// assert_eq!(p.normalized(), "add : :");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    root: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Splits `source` into a root word and segments.
    ///
    /// A word starting with `capture_prefix` is a capture unless it is the
    /// prefix alone, which stays a literal.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyPattern`] if `source` has no words.
    pub fn parse(source: &str, capture_prefix: char) -> Result<Self> {
        let mut words = source.split_whitespace();
        let root = words.next().ok_or(ConfigError::EmptyPattern)?;
        let segments = words.map(|w| Segment::parse(w, capture_prefix)).collect();
        Ok(Self {
            source: source.split_whitespace().collect::<Vec<_>>().join(" "),
            root: root.to_string(),
            segments,
        })
    }

    /// The pattern as registered, with whitespace collapsed.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Matching sequence, root excluded.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of tokens after the root a full match consumes.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if the pattern is the root word alone.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Root-excluded skeleton with every capture collapsed to `:`.
    pub fn normalized(&self) -> String {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(word) => word.as_str(),
                Segment::Capture(_) => CAPTURE_PLACEHOLDER,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Capture names in pattern order.
    pub fn captures(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Capture(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
