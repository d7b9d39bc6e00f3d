//! Hierarchical topic paths.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `/`-separated topic path such as `software/architecture/patterns`.
///
/// Segments are `[A-Za-z0-9_-]+` and compared case-sensitively. Leading,
/// trailing and repeated separators are dropped, so `/a//b/` and `a/b` are
/// the same topic.
///
/// ```
/// use notedex::domain::Topic;
///
/// let topic = Topic::new("/software//architecture/").unwrap();
/// assert_eq!(topic.as_str(), "software/architecture");
/// assert_eq!(topic.parent().unwrap().as_str(), "software");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Topic {
    path: String,
}

/// Error returned when a topic path is empty or has an invalid segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTopicError(String);

impl fmt::Display for ParseTopicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ParseTopicError {}

impl Topic {
    /// Normalizes and validates `path`.
    pub fn new(path: &str) -> Result<Self, ParseTopicError> {
        let mut segments = Vec::new();
        for raw in path.trim().split('/') {
            if raw.is_empty() {
                continue;
            }
            let seg = raw.trim();
            if seg.is_empty() {
                return Err(ParseTopicError(
                    "topic segments cannot be whitespace-only".to_string(),
                ));
            }
            if !seg
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return Err(ParseTopicError(format!(
                    "invalid topic segment '{}': use letters, digits, '-' or '_'",
                    seg
                )));
            }
            segments.push(seg);
        }

        if segments.is_empty() {
            return Err(ParseTopicError("topic path cannot be empty".to_string()));
        }

        Ok(Self {
            path: segments.join("/"),
        })
    }

    /// The normalized path.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/')
    }

    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// The enclosing topic, `None` at the root level.
    pub fn parent(&self) -> Option<Topic> {
        self.path.rfind('/').map(|idx| Topic {
            path: self.path[..idx].to_string(),
        })
    }

    /// Every proper ancestor, outermost first.
    pub fn ancestors(&self) -> Vec<Topic> {
        let mut result: Vec<Topic> = std::iter::successors(self.parent(), Topic::parent).collect();
        result.reverse();
        result
    }

    /// True when `other` lies strictly below this topic.
    ///
    /// Matching is by segment, so `software` is not an ancestor of
    /// `software-dev`.
    pub fn is_ancestor_of(&self, other: &Topic) -> bool {
        other.path.len() > self.path.len()
            && other.path.starts_with(&self.path)
            && other.path.as_bytes()[self.path.len()] == b'/'
    }

    /// Exclusive upper bound of the descendant range `[path + "/", path + "0")`.
    ///
    /// `'0'` is the byte after `'/'`, so every descendant path sorts inside
    /// the range and no sibling such as `path-x` does.
    pub fn descendant_upper_bound(&self) -> String {
        format!("{}0", self.path)
    }

    /// Inclusive lower bound of the descendant range.
    pub fn descendant_lower_bound(&self) -> String {
        format!("{}/", self.path)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl fmt::Debug for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Topic(\"{}\")", self.path)
    }
}

impl FromStr for Topic {
    type Err = ParseTopicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Topic {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.path)
    }
}

impl<'de> Deserialize<'de> for Topic {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
