//! Narrowing shared by `ls` and `search`.

use anyhow::{Context, Result};
use std::collections::HashSet;

use crate::cli::date_filter::DateFilter;
use crate::domain::{Note, NoteId, Tag};
use crate::index::{IndexRepository, IndexedNote, SqliteIndex, TopicFilter};

/// Hidden from listings and search unless asked for.
pub const ARCHIVED_TAG: &str = "archived";

#[derive(Debug, Default)]
pub struct NoteFilter {
    topic: Option<TopicFilter>,
    tags: Vec<Tag>,
    created: Option<DateFilter>,
    modified: Option<DateFilter>,
    include_archived: bool,
}

impl NoteFilter {
    pub fn new(topic: Option<&str>, tags: &[String], include_archived: bool) -> Result<Self> {
        let topic = topic.map(TopicFilter::parse).transpose()?;
        let tags = tags
            .iter()
            .map(|t| Tag::new(t).with_context(|| format!("invalid tag: {}", t)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            topic,
            tags,
            include_archived,
            ..Self::default()
        })
    }

    pub fn created(mut self, created: Option<DateFilter>) -> Self {
        self.created = created;
        self
    }

    pub fn modified(mut self, modified: Option<DateFilter>) -> Self {
        self.modified = modified;
        self
    }

    /// Notes matching the topic and tags, or `None` when neither is set.
    ///
    /// Topic narrows first; tags intersect with what remains.
    pub fn narrow(&self, index: &SqliteIndex) -> Result<Option<Vec<IndexedNote>>> {
        let mut notes = match &self.topic {
            Some(filter) => Some(
                index
                    .list_by_topic(&filter.topic, filter.include_descendants)
                    .with_context(|| format!("failed to list notes under {}", filter.topic))?,
            ),
            None => None,
        };

        if !self.tags.is_empty() {
            let tagged = index
                .list_by_tags(&self.tags)
                .with_context(|| "failed to list notes by tag")?;
            notes = Some(match notes {
                None => tagged,
                Some(mut notes) => {
                    let tagged: HashSet<NoteId> = tagged.iter().map(|n| n.id().clone()).collect();
                    notes.retain(|n| tagged.contains(n.id()));
                    notes
                }
            });
        }

        Ok(notes)
    }

    /// Date and archive checks, applied to each candidate.
    pub fn keeps(&self, note: &Note) -> bool {
        if !self.include_archived && note.tags().iter().any(|t| t.as_str() == ARCHIVED_TAG) {
            return false;
        }
        if let Some(created) = &self.created
            && !created.matches(note.created())
        {
            return false;
        }
        if let Some(modified) = &self.modified
            && !modified.matches(note.modified())
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn note(tags: &[&str], year: i32) -> Note {
        let at = Utc.with_ymd_and_hms(year, 6, 1, 0, 0, 0).unwrap();
        Note::builder(NoteId::new(), "N", at, at)
            .tags(tags.iter().map(|t| Tag::new(t).unwrap()).collect())
            .build()
            .unwrap()
    }

    #[test]
    fn archived_is_hidden_by_default() {
        let filter = NoteFilter::new(None, &[], false).unwrap();
        assert!(!filter.keeps(&note(&["archived"], 2024)));
        assert!(filter.keeps(&note(&["draft"], 2024)));
    }

    #[test]
    fn include_archived_keeps_archived() {
        let filter = NoteFilter::new(None, &[], true).unwrap();
        assert!(filter.keeps(&note(&["archived"], 2024)));
    }

    #[test]
    fn date_filters_check_their_own_timestamp() {
        let created: DateFilter = "2024-01-01".parse().unwrap();
        let filter = NoteFilter::new(None, &[], false).unwrap().created(Some(created));
        assert!(filter.keeps(&note(&[], 2024)));
        assert!(!filter.keeps(&note(&[], 2023)));

        let modified: DateFilter = "2025-01-01".parse().unwrap();
        let filter = NoteFilter::new(None, &[], false).unwrap().modified(Some(modified));
        assert!(!filter.keeps(&note(&[], 2024)));
    }

    #[test]
    fn invalid_tag_is_an_error() {
        assert!(NoteFilter::new(None, &["not a tag".to_string()], false).is_err());
    }
}
