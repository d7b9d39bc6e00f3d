//! The note record carried by a file's frontmatter.

use crate::domain::{Link, NoteId, Tag, Topic};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Error returned when a note fails construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseNoteError {
    EmptyTitle,
}

impl fmt::Display for ParseNoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseNoteError::EmptyTitle => f.write_str("invalid note: title cannot be empty"),
        }
    }
}

impl std::error::Error for ParseNoteError {}

/// Metadata of a single note.
///
/// Collections are normalized on construction:
/// - topics and tags are deduplicated and sorted
/// - aliases are trimmed, blank ones dropped, and deduplicated
///   case-insensitively keeping the first spelling and the written order
/// - links to the same target are merged into one link, sorted by target
///
/// ```
/// use notedex::domain::{Note, NoteId};
/// use chrono::Utc;
///
/// let now = Utc::now();
/// let note = Note::builder(NoteId::new(), "  API Design ", now, now)
///     .aliases(vec!["REST".into(), "rest".into(), " ".into()])
///     .build()
///     .unwrap();
/// assert_eq!(note.title(), "API Design");
/// assert_eq!(note.aliases(), &["REST".to_string()]);
/// ```
#[derive(Clone, PartialEq)]
pub struct Note {
    id: NoteId,
    title: String,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
    description: Option<String>,
    topics: Vec<Topic>,
    aliases: Vec<String>,
    tags: Vec<Tag>,
    links: Vec<Link>,
}

impl Note {
    /// A note without any optional metadata.
    pub fn new(
        id: NoteId,
        title: impl Into<String>,
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
    ) -> Result<Self, ParseNoteError> {
        Self::builder(id, title, created, modified).build()
    }

    pub fn builder(
        id: NoteId,
        title: impl Into<String>,
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
    ) -> NoteBuilder {
        NoteBuilder {
            id,
            title: title.into(),
            created,
            modified,
            description: None,
            topics: Vec::new(),
            aliases: Vec::new(),
            tags: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn id(&self) -> &NoteId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Aliases joined by spaces, the form fed to full-text search.
    pub fn aliases_text(&self) -> String {
        self.aliases.join(" ")
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.title, self.id.prefix())
    }
}

impl fmt::Debug for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Note")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("created", &self.created)
            .field("modified", &self.modified)
            .field("description", &self.description)
            .field("topics", &self.topics)
            .field("aliases", &self.aliases)
            .field("tags", &self.tags)
            .field("links", &self.links)
            .finish()
    }
}

/// Builder for a [`Note`] with optional metadata.
#[derive(Debug, Clone)]
pub struct NoteBuilder {
    id: NoteId,
    title: String,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
    description: Option<String>,
    topics: Vec<Topic>,
    aliases: Vec<String>,
    tags: Vec<Tag>,
    links: Vec<Link>,
}

impl NoteBuilder {
    /// Blank descriptions become `None`.
    pub fn description(mut self, description: Option<impl Into<String>>) -> Self {
        self.description = description
            .map(|s| s.into().trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    pub fn topics(mut self, mut topics: Vec<Topic>) -> Self {
        topics.sort();
        topics.dedup();
        self.topics = topics;
        self
    }

    pub fn aliases(mut self, aliases: Vec<String>) -> Self {
        let mut seen = HashSet::new();
        self.aliases = aliases
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty() && seen.insert(a.to_lowercase()))
            .collect();
        self
    }

    pub fn tags(mut self, mut tags: Vec<Tag>) -> Self {
        tags.sort();
        tags.dedup();
        self.tags = tags;
        self
    }

    /// Links sharing a target collapse into one.
    pub fn links(mut self, links: Vec<Link>) -> Self {
        let mut by_target: BTreeMap<NoteId, Link> = BTreeMap::new();
        for link in links {
            match by_target.get_mut(link.target()) {
                Some(existing) => existing.merge(link),
                None => {
                    by_target.insert(link.target().clone(), link);
                }
            }
        }
        self.links = by_target.into_values().collect();
        self
    }

    pub fn build(self) -> Result<Note, ParseNoteError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ParseNoteError::EmptyTitle);
        }

        Ok(Note {
            id: self.id,
            title: title.to_string(),
            created: self.created,
            modified: self.modified,
            description: self.description,
            topics: self.topics,
            aliases: self.aliases,
            tags: self.tags,
            links: self.links,
        })
    }
}

impl Serialize for Note {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("title", &self.title)?;
        map.serialize_entry("created", &self.created)?;
        map.serialize_entry("modified", &self.modified)?;
        if let Some(desc) = &self.description {
            map.serialize_entry("description", desc)?;
        }
        if !self.topics.is_empty() {
            map.serialize_entry("topics", &self.topics)?;
        }
        if !self.aliases.is_empty() {
            map.serialize_entry("aliases", &self.aliases)?;
        }
        if !self.tags.is_empty() {
            map.serialize_entry("tags", &self.tags)?;
        }
        if !self.links.is_empty() {
            map.serialize_entry("links", &self.links)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Note {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            id: NoteId,
            title: String,
            created: DateTime<Utc>,
            modified: DateTime<Utc>,
            #[serde(default)]
            description: Option<String>,
            #[serde(default)]
            topics: Vec<Topic>,
            #[serde(default)]
            aliases: Vec<String>,
            #[serde(default)]
            tags: Vec<Tag>,
            #[serde(default)]
            links: Vec<Link>,
        }

        let raw = Raw::deserialize(deserializer)?;
        Note::builder(raw.id, raw.title, raw.created, raw.modified)
            .description(raw.description)
            .topics(raw.topics)
            .aliases(raw.aliases)
            .tags(raw.tags)
            .links(raw.links)
            .build()
            .map_err(serde::de::Error::custom)
    }
}
