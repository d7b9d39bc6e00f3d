//! Builder for test notes with sensible defaults.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use notedex::domain::{Link, Note, NoteId, Tag, Topic};

/// Builder for test notes. Generates an id and timestamps; everything else
/// is opt-in.
#[derive(Debug, Clone)]
pub struct TestNote {
    id: NoteId,
    title: String,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
    description: Option<String>,
    topics: Vec<Topic>,
    aliases: Vec<String>,
    tags: Vec<Tag>,
    links: Vec<Link>,
    body: String,
}

impl TestNote {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: NoteId::new(),
            title: title.into(),
            created: now,
            modified: now,
            description: None,
            topics: Vec::new(),
            aliases: Vec::new(),
            tags: Vec::new(),
            links: Vec::new(),
            body: String::new(),
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into().parse().expect("Invalid NoteId");
        self
    }

    pub fn topic(mut self, topic: impl AsRef<str>) -> Self {
        self.topics
            .push(Topic::new(topic.as_ref()).expect("Invalid topic"));
        self
    }

    pub fn tag(mut self, tag: impl AsRef<str>) -> Self {
        self.tags.push(Tag::new(tag.as_ref()).expect("Invalid tag"));
        self
    }

    /// Sets both timestamps to midnight UTC of the given date.
    pub fn dated(mut self, date: &str) -> Self {
        let at = format!("{date}T00:00:00Z")
            .parse()
            .expect("Invalid date");
        self.created = at;
        self.modified = at;
        self
    }

    pub fn modified(mut self, date: &str) -> Self {
        self.modified = format!("{date}T00:00:00Z")
            .parse()
            .expect("Invalid date");
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Links to `target` with a single relationship type.
    pub fn link(mut self, target: &TestNote, rel: &str) -> Self {
        self.links
            .push(Link::new(target.id.clone(), [rel]).expect("Invalid link"));
        self
    }

    pub fn link_to_id(mut self, target: &str, rel: &str) -> Self {
        let target: NoteId = target.parse().expect("Invalid NoteId");
        self.links.push(Link::new(target, [rel]).expect("Invalid link"));
        self
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn id_prefix(&self) -> String {
        self.id.prefix()
    }

    pub fn get_body(&self) -> &str {
        &self.body
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn note_id(&self) -> &NoteId {
        &self.id
    }

    /// File name under the notes root: full id plus a slug of the title.
    pub fn filename(&self) -> String {
        let slug: String = self
            .title
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        let slug = slug
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        format!("{}-{}.md", self.id, slug)
    }

    pub fn to_note(&self) -> Note {
        Note::builder(self.id.clone(), &self.title, self.created, self.modified)
            .description(self.description.clone())
            .topics(self.topics.clone())
            .aliases(self.aliases.clone())
            .tags(self.tags.clone())
            .links(self.links.clone())
            .build()
            .expect("TestNote should always produce valid Note")
    }

    /// The full markdown document: YAML frontmatter then body.
    pub fn to_markdown(&self) -> String {
        let yaml = serde_yaml::to_string(&self.to_note()).expect("Note should serialize");
        format!("---\n{}---\n{}", yaml, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notedex::infra::parse;

    #[test]
    fn test_note_markdown_parses_back() {
        let target = TestNote::new("Target");
        let note = TestNote::new("Architecture Decisions")
            .topic("software/architecture")
            .tag("adr")
            .alias("ADRs")
            .link(&target, "see-also")
            .description("Important decisions")
            .body("# ADR-001\n\nWe chose Rust.");

        let parsed = parse(&note.to_markdown()).unwrap();
        assert_eq!(parsed.note, note.to_note());
        assert_eq!(parsed.body, "# ADR-001\n\nWe chose Rust.");
    }

    #[test]
    fn test_note_filename_uses_id_and_slug() {
        let note = TestNote::new("Hello, World!").id("01HQ3K5M7NXJK4QZPW8V2R6T9Y");
        assert_eq!(note.filename(), "01HQ3K5M7NXJK4QZPW8V2R6T9Y-hello-world.md");
    }

    #[test]
    fn test_notes_with_same_title_get_distinct_files() {
        let first = TestNote::new("Twin");
        let second = TestNote::new("Twin");
        assert_ne!(first.filename(), second.filename());
    }
}
