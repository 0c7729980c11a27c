//! Path patterns for scoped traversal.
//!
//! # Pattern Syntax
//!
//! | Segment | Matches |
//! |---------|---------|
//! | `name` | the property `name` |
//! | `3` | item index 3 (or a property literally named `3`) |
//! | `1-4` | item indexes 1 through 4 inclusive |
//! | `*` | any single segment |
//! | `**` | anything below this point |
//!
//! Patterns are `/`-separated; the leading `/` is optional. `/` alone allows the root and
//! nothing below it.
//!
//! # Examples
//!
//! ```
//! use blue_language::limits::PathPattern;
//!
//! let pattern = PathPattern::parse("/a/*/c").unwrap();
//! assert!(pattern.allows(&["a", "b"], "c"));
//! assert!(!pattern.allows(&["a", "b"], "d"));
//! ```

use std::fmt;

use crate::error::{BlueError, Result};

/// One segment of a path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Exact property name
    Name(String),
    /// Exact list index
    Index(usize),
    /// Inclusive index range
    Range(usize, usize),
    /// `*`, any single segment
    Wildcard,
    /// `**`, any number of segments
    DeepWildcard,
}

impl PathSegment {
    /// Parse a single segment.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(BlueError::InvalidPath("empty path segment".to_string()));
        }
        match raw {
            "*" => return Ok(PathSegment::Wildcard),
            "**" => return Ok(PathSegment::DeepWildcard),
            _ => {}
        }
        if let Ok(index) = raw.parse::<usize>() {
            return Ok(PathSegment::Index(index));
        }
        if let Some((low, high)) = raw.split_once('-') {
            if let (Ok(low), Ok(high)) = (low.parse::<usize>(), high.parse::<usize>()) {
                if low > high {
                    return Err(BlueError::InvalidPath(format!(
                        "range {} has its lower bound above its upper bound",
                        raw
                    )));
                }
                return Ok(PathSegment::Range(low, high));
            }
        }
        Ok(PathSegment::Name(raw.to_string()))
    }

    /// Whether this pattern segment accepts the concrete segment `actual`.
    pub fn matches(&self, actual: &str) -> bool {
        match self {
            PathSegment::Name(name) => name == actual,
            PathSegment::Index(index) => actual.parse::<usize>().is_ok_and(|i| i == *index),
            PathSegment::Range(low, high) => actual
                .parse::<usize>()
                .is_ok_and(|i| (*low..=*high).contains(&i)),
            PathSegment::Wildcard | PathSegment::DeepWildcard => true,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Name(name) => f.write_str(name),
            PathSegment::Index(index) => write!(f, "{}", index),
            PathSegment::Range(low, high) => write!(f, "{}-{}", low, high),
            PathSegment::Wildcard => f.write_str("*"),
            PathSegment::DeepWildcard => f.write_str("**"),
        }
    }
}

/// A parsed path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<PathSegment>,
}

impl PathPattern {
    /// Parse a pattern such as `/a/0-2/**`.
    pub fn parse(pattern: &str) -> Result<Self> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Err(BlueError::InvalidPath("path pattern is empty".to_string()));
        }
        let body = trimmed.strip_prefix('/').unwrap_or(trimmed);
        let body = body.strip_suffix('/').unwrap_or(body);
        if body.is_empty() {
            return Ok(Self { segments: Vec::new() });
        }

        let segments = body
            .split('/')
            .map(PathSegment::parse)
            .collect::<Result<Vec<_>>>()?;

        if let Some(pos) = segments.iter().position(|s| *s == PathSegment::DeepWildcard) {
            if pos + 1 != segments.len() {
                return Err(BlueError::InvalidPath(format!(
                    "** must be the last segment in {}",
                    pattern
                )));
            }
        }
        Ok(Self { segments })
    }

    /// The pattern `/`: the root and nothing below it.
    pub fn root() -> Self {
        Self { segments: Vec::new() }
    }

    /// Parsed segments; empty for the root pattern.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Whether a traversal at `current` may descend into `next`.
    pub fn allows<S: AsRef<str>>(&self, current: &[S], next: &str) -> bool {
        let candidate = current.iter().map(AsRef::as_ref).chain(std::iter::once(next));
        for (i, actual) in candidate.enumerate() {
            match self.segments.get(i) {
                None => return false,
                Some(PathSegment::DeepWildcard) => return true,
                Some(segment) if !segment.matches(actual) => return false,
                Some(_) => {}
            }
        }
        true
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}
