//! Flat, lowercase tag labels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A flat label matching `[a-z0-9_-]+`.
///
/// Input is trimmed and lowercased before validation, so `Draft` and
/// `draft` name the same tag.
///
/// ```
/// use notedex::domain::Tag;
///
/// assert_eq!(Tag::new(" Draft ").unwrap().as_str(), "draft");
/// assert!(Tag::new("two words").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTagError(String);

impl fmt::Display for ParseTagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ParseTagError {}

impl Tag {
    pub fn new(s: &str) -> Result<Self, ParseTagError> {
        let value = s.trim().to_lowercase();
        if value.is_empty() {
            return Err(ParseTagError("tag cannot be empty".to_string()));
        }
        let valid = value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        if !valid {
            return Err(ParseTagError(format!(
                "invalid tag '{}': use a-z, 0-9, '-' or '_'",
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag(\"{}\")", self.0)
    }
}

impl FromStr for Tag {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Tag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lowercases_and_trims() {
        assert_eq!(Tag::new("  DRAFT ").unwrap().as_str(), "draft");
        assert_eq!(Tag::new("Draft").unwrap(), Tag::new("draft").unwrap());
    }

    #[test]
    fn accepts_digits_hyphen_underscore() {
        assert!(Tag::new("q3-2024_review").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!(Tag::new("").is_err());
        assert!(Tag::new("   ").is_err());
    }

    #[test]
    fn rejects_separators_and_punctuation() {
        for bad in ["two words", "a/b", "a.b", "a#b", "\u{fc}ber"] {
            assert!(Tag::new(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn error_message_names_the_tag() {
        let err = Tag::new("a/b").unwrap_err();
        assert!(err.to_string().contains("'a/b'"));
    }

    #[test]
    fn deserializes_from_yaml_sequence() {
        let tags: Vec<Tag> = serde_yaml::from_str("[Rust, cli]").unwrap();
        assert_eq!(tags, vec![Tag::new("rust").unwrap(), Tag::new("cli").unwrap()]);
    }
}
