//! Hierarchical task names and wildcard patterns
//!
//! Task names are dotted identifiers such as `app.test.unit`. Patterns share
//! the same syntax, with two wildcards:
//!
//! - `*` matches exactly one segment. Mixed with text (`*test`) it matches any
//!   segment of that shape.
//! - `**` matches zero or more segments.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Separator between name segments
pub const SEPARATOR: char = '.';

/// Matches exactly one segment
pub const MATCH_ANYTHING: &str = "*";

/// Matches zero or more segments
pub const MATCH_RECURSIVE: &str = "**";

/// Pattern used when the caller does not supply one
pub const DEFAULT_PATTERN: &str = MATCH_RECURSIVE;

/// A dotted task identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskName {
    segments: Vec<String>,
}

impl TaskName {
    /// Split a dotted string into segments.
    ///
    /// Never produces an empty segment list: `""` yields one empty segment.
    pub fn parse(s: &str) -> Self {
        TaskName {
            segments: s.split(SEPARATOR).map(str::to_string).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segment-wise prefix test. A name is an ancestor of itself.
    pub fn is_ancestor_of(&self, other: &TaskName) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// True if `other` is exactly one segment deeper under this name
    pub fn is_parent_of(&self, other: &TaskName) -> bool {
        self.len() + 1 == other.len() && self.is_ancestor_of(other)
    }

    pub fn is_child_of(&self, other: &TaskName) -> bool {
        other.is_parent_of(self)
    }

    pub fn is_root(&self) -> bool {
        self.len() <= 1
    }

    /// The name with its last segment removed. A root name is its own parent.
    pub fn parent(&self) -> TaskName {
        if self.is_root() {
            return self.clone();
        }
        TaskName {
            segments: self.segments[..self.len() - 1].to_vec(),
        }
    }

    /// Check this name against a pattern string
    ///
    /// ```
    /// use arbor::name::TaskName;
    ///
    /// let name = TaskName::parse("A.B.unittest");
    /// assert!(name.matches("*.*.*test"));
    /// assert!(name.matches("**.*test"));
    /// assert!(!name.matches("*.*.*.*"));
    /// ```
    pub fn matches(&self, pattern: &str) -> bool {
        self.matches_pattern(&Pattern::parse(pattern))
    }

    /// Check this name against a pre-compiled pattern
    pub fn matches_pattern(&self, pattern: &Pattern) -> bool {
        match_segments(&self.segments, &pattern.segments)
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join(&SEPARATOR.to_string()))
    }
}

impl FromStr for TaskName {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TaskName::parse(s))
    }
}

impl From<&str> for TaskName {
    fn from(s: &str) -> Self {
        TaskName::parse(s)
    }
}

impl Serialize for TaskName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TaskName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(TaskName::parse(&s))
    }
}

/// One compiled pattern segment
#[derive(Debug, Clone)]
enum Segment {
    /// `**`
    Recursive,
    /// `*`
    Any,
    /// Plain text, compared for equality
    Literal(String),
    /// Text mixed with `*`. `None` when the expression failed to compile.
    Wildcard(String, Option<Regex>),
}

impl Segment {
    fn compile(text: &str) -> Self {
        if text == MATCH_RECURSIVE {
            return Segment::Recursive;
        }
        if text == MATCH_ANYTHING {
            return Segment::Any;
        }
        if !text.contains(MATCH_ANYTHING) {
            return Segment::Literal(text.to_string());
        }

        let body = text
            .split(MATCH_ANYTHING)
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let regex = match Regex::new(&format!("^{}$", body)) {
            Ok(regex) => Some(regex),
            Err(e) => {
                tracing::debug!("pattern segment {:?} never matches: {}", text, e);
                None
            }
        };
        Segment::Wildcard(text.to_string(), regex)
    }

    fn is_recursive(&self) -> bool {
        matches!(self, Segment::Recursive)
    }

    /// Single-segment match. `**` is handled by the caller, never here.
    fn matches_item(&self, item: &str) -> bool {
        match self {
            Segment::Recursive => false,
            Segment::Any => true,
            Segment::Literal(text) => text == item,
            Segment::Wildcard(text, regex) => {
                text == item || regex.as_ref().is_some_and(|r| r.is_match(item))
            }
        }
    }

    fn as_str(&self) -> &str {
        match self {
            Segment::Recursive => MATCH_RECURSIVE,
            Segment::Any => MATCH_ANYTHING,
            Segment::Literal(text) | Segment::Wildcard(text, _) => text,
        }
    }
}

/// A compiled task name pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn parse(s: &str) -> Self {
        Pattern {
            segments: s.split(SEPARATOR).map(Segment::compile).collect(),
        }
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Pattern::parse(DEFAULT_PATTERN)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self.segments.iter().map(Segment::as_str).collect();
        write!(f, "{}", parts.join(&SEPARATOR.to_string()))
    }
}

fn match_segments(name: &[String], pattern: &[Segment]) -> bool {
    match (name, pattern) {
        ([], []) => true,
        (_, []) | ([], _) => false,
        (_, [Segment::Recursive]) => true,
        _ => {
            let last_name = name.len() - 1;
            let last_pattern = pattern.len() - 1;

            if pattern[0].matches_item(&name[0]) {
                return match_segments(&name[1..], &pattern[1..]);
            }
            if pattern[last_pattern].matches_item(&name[last_name]) {
                return match_segments(&name[..last_name], &pattern[..last_pattern]);
            }
            if pattern[0].is_recursive() {
                let remaining = &pattern[1..];
                let required = remaining.iter().filter(|s| !s.is_recursive()).count();

                // Let `**` swallow progressively more segments, leaving
                // enough for the rest of the pattern.
                return (0..=name.len())
                    .take_while(|skip| name.len() - skip >= required)
                    .any(|skip| match_segments(&name[skip..], remaining));
            }
            false
        }
    }
}

/// Convenience form of [`TaskName::matches`] for plain strings
pub fn matches(name: &str, pattern: &str) -> bool {
    TaskName::parse(name).matches(pattern)
}
