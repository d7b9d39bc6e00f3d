//! Typed links between notes.

use crate::domain::NoteId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A relationship label such as `parent`, `see-also` or `supersedes`.
///
/// Labels match `[a-z0-9-]+` after trimming and lowercasing. Underscores are
/// not allowed, which keeps rels visually distinct from tags.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rel(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRelError(String);

impl fmt::Display for ParseRelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ParseRelError {}

impl Rel {
    pub fn new(s: &str) -> Result<Self, ParseRelError> {
        let value = s.trim().to_lowercase();
        if value.is_empty() {
            return Err(ParseRelError("relationship cannot be empty".to_string()));
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ParseRelError(format!(
                "invalid relationship '{}': use a-z, 0-9 or '-'",
                value
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Rel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Rel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rel(\"{}\")", self.0)
    }
}

impl FromStr for Rel {
    type Err = ParseRelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Rel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Rel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An outgoing link to another note.
///
/// The target may not exist in the index. The rel set is never empty and is
/// kept sorted without duplicates, so two links with the same labels compare
/// equal regardless of the order they were written in.
///
/// ```
/// use notedex::domain::{Link, NoteId};
///
/// let target: NoteId = "01HQ3K5M7NXJK4QZPW8V2R6T9Y".parse().unwrap();
/// let link = Link::new(target, ["see-also", "parent", "parent"]).unwrap();
/// assert_eq!(link.rels().len(), 2);
/// assert_eq!(link.rels()[0].as_str(), "parent");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Link {
    target: NoteId,
    rels: Vec<Rel>,
    context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLinkError(String);

impl fmt::Display for ParseLinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ParseLinkError {}

impl Link {
    pub fn new<I, S>(target: NoteId, rels: I) -> Result<Self, ParseLinkError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rels = rels
            .into_iter()
            .map(|s| Rel::new(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ParseLinkError(e.to_string()))?;
        Self::from_rels(target, rels, None)
    }

    /// Builds a link from already-validated rels.
    pub fn from_rels(
        target: NoteId,
        mut rels: Vec<Rel>,
        context: Option<String>,
    ) -> Result<Self, ParseLinkError> {
        rels.sort();
        rels.dedup();
        if rels.is_empty() {
            return Err(ParseLinkError(format!(
                "link to {} needs at least one relationship",
                target
            )));
        }
        let context = context
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Ok(Self {
            target,
            rels,
            context,
        })
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into().trim().to_string();
        self.context = (!context.is_empty()).then_some(context);
        self
    }

    pub fn target(&self) -> &NoteId {
        &self.target
    }

    pub fn rels(&self) -> &[Rel] {
        &self.rels
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn has_rel(&self, rel: &Rel) -> bool {
        self.rels.binary_search(rel).is_ok()
    }

    /// Folds another link to the same target into this one.
    ///
    /// Rels are unioned; an existing context is kept.
    pub fn merge(&mut self, other: Link) {
        debug_assert_eq!(self.target, other.target);
        self.rels.extend(other.rels);
        self.rels.sort();
        self.rels.dedup();
        if self.context.is_none() {
            self.context = other.context;
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rels: Vec<&str> = self.rels.iter().map(Rel::as_str).collect();
        write!(f, "{} [{}]", self.target.prefix(), rels.join(", "))
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("target", &self.target)
            .field("rels", &self.rels)
            .field("context", &self.context)
            .finish()
    }
}

// Frontmatter shape: `{ id, rel: [..], note? }`.
impl Serialize for Link {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.target)?;
        map.serialize_entry("rel", &self.rels)?;
        if let Some(ctx) = &self.context {
            map.serialize_entry("note", ctx)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Link {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Raw {
            id: NoteId,
            rel: Vec<Rel>,
            note: Option<String>,
        }

        let raw = Raw::deserialize(deserializer)?;
        Link::from_rels(raw.id, raw.rel, raw.note).map_err(serde::de::Error::custom)
    }
}
