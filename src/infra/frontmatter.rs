//! Splits a markdown document into YAML frontmatter and body.

use crate::domain::Note;
use crate::infra::ContentHash;
use thiserror::Error;

/// A successfully read note: metadata, body text and the raw-byte hash.
#[derive(Debug, Clone)]
pub struct ParsedNote {
    pub note: Note,
    pub body: String,
    pub content_hash: ContentHash,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("missing opening frontmatter delimiter '---'")]
    MissingOpeningDelimiter,

    #[error("missing closing frontmatter delimiter '---'")]
    MissingClosingDelimiter,

    #[error("frontmatter is empty")]
    EmptyFrontmatter,

    #[error("invalid frontmatter: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
}

/// Parses a document held in memory, hashing its UTF-8 bytes.
///
/// The document must open with a `---` line and close the YAML block with
/// another `---` line:
///
/// ```text
/// ---
/// id: 01HQ3K5M7NXJK4QZPW8V2R6T9Y
/// title: Note Title
/// created: 2024-01-15T10:30:00Z
/// modified: 2024-01-15T10:30:00Z
/// ---
/// Body...
/// ```
///
/// Files on disk go through [`crate::infra::read_note`] instead, which
/// hashes the bytes before any decoding.
pub fn parse(content: &str) -> Result<ParsedNote, ParseError> {
    parse_with_hash(content, ContentHash::compute(content.as_bytes()))
}

pub(crate) fn parse_with_hash(
    content: &str,
    content_hash: ContentHash,
) -> Result<ParsedNote, ParseError> {
    let (yaml, body) = split(content)?;
    if yaml.trim().is_empty() {
        return Err(ParseError::EmptyFrontmatter);
    }
    let note: Note = serde_yaml::from_str(yaml)?;

    Ok(ParsedNote {
        note,
        body: body.to_string(),
        content_hash,
    })
}

/// Returns `(yaml, body)` slices of `content`.
fn split(content: &str) -> Result<(&str, &str), ParseError> {
    let rest = match strip_delimiter_line(content) {
        Some(rest) => rest,
        None if content == "---" => return Err(ParseError::MissingClosingDelimiter),
        None => return Err(ParseError::MissingOpeningDelimiter),
    };

    let mut offset = 0;
    loop {
        let line_rest = &rest[offset..];
        if let Some(body) = strip_delimiter_line(line_rest) {
            return Ok((&rest[..offset], body));
        }
        if line_rest == "---" {
            return Ok((&rest[..offset], ""));
        }
        match line_rest.find('\n') {
            Some(nl) => offset += nl + 1,
            None => return Err(ParseError::MissingClosingDelimiter),
        }
    }
}

/// Strips a leading `---\n` or `---\r\n`, returning what follows.
fn strip_delimiter_line(s: &str) -> Option<&str> {
    s.strip_prefix("---\n")
        .or_else(|| s.strip_prefix("---\r\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HEADER: &str = "id: 01HQ3K5M7NXJK4QZPW8V2R6T9Y\n\
                          title: API Design\n\
                          created: 2024-01-15T10:30:00Z\n\
                          modified: 2024-01-15T10:30:00Z\n";

    fn doc(body: &str) -> String {
        format!("---\n{HEADER}---\n{body}")
    }

    #[test]
    fn parses_minimal_document() {
        let parsed = parse(&doc("")).unwrap();
        assert_eq!(parsed.note.title(), "API Design");
        assert_eq!(parsed.body, "");
    }

    #[test]
    fn body_is_preserved_verbatim() {
        let body = "    indented\n\n--- not a delimiter\n\n\n";
        assert_eq!(parse(&doc(body)).unwrap().body, body);
    }

    #[test]
    fn closing_delimiter_at_eof() {
        let content = format!("---\n{HEADER}---");
        assert_eq!(parse(&content).unwrap().body, "");
    }

    #[test]
    fn crlf_delimiters() {
        let content = format!("---\r\n{}---\r\nBody\r\n", HEADER.replace('\n', "\r\n"));
        let parsed = parse(&content).unwrap();
        assert_eq!(parsed.note.title(), "API Design");
        assert_eq!(parsed.body, "Body\r\n");
    }

    #[test]
    fn missing_opening_delimiter() {
        assert!(matches!(
            parse(&format!("{HEADER}---\n")),
            Err(ParseError::MissingOpeningDelimiter)
        ));
        assert!(matches!(
            parse(&format!(" ---\n{HEADER}---\n")),
            Err(ParseError::MissingOpeningDelimiter)
        ));
    }

    #[test]
    fn missing_closing_delimiter() {
        assert!(matches!(
            parse(&format!("---\n{HEADER}body\n")),
            Err(ParseError::MissingClosingDelimiter)
        ));
        assert!(matches!(parse("---"), Err(ParseError::MissingClosingDelimiter)));
    }

    #[test]
    fn empty_frontmatter() {
        assert!(matches!(parse("---\n---\n"), Err(ParseError::EmptyFrontmatter)));
    }

    #[test]
    fn missing_required_field_is_invalid_yaml() {
        let content = "---\nid: 01HQ3K5M7NXJK4QZPW8V2R6T9Y\ntitle: T\n---\n";
        let err = parse(content).unwrap_err();
        assert!(matches!(err, ParseError::InvalidYaml(_)));
        assert!(err.to_string().contains("created"));
    }

    #[test]
    fn invalid_nested_values_are_rejected() {
        let bad_tag = format!("---\n{HEADER}tags: [\"two words\"]\n---\n");
        let bad_topic = format!("---\n{HEADER}topics: [\"///\"]\n---\n");
        let bad_id = "---\nid: nope\ntitle: T\ncreated: 2024-01-15T10:30:00Z\nmodified: 2024-01-15T10:30:00Z\n---\n";
        assert!(parse(&bad_tag).is_err());
        assert!(parse(&bad_topic).is_err());
        assert!(parse(bad_id).is_err());
    }

    #[test]
    fn hash_covers_whole_document() {
        let a = parse(&doc("one")).unwrap();
        let b = parse(&doc("two")).unwrap();
        assert_ne!(a.content_hash, b.content_hash);
        assert_eq!(a.content_hash, ContentHash::compute(doc("one").as_bytes()));
    }

    #[test]
    fn unicode_metadata() {
        let content = "---\nid: 01HQ3K5M7NXJK4QZPW8V2R6T9Y\ntitle: \u{65e5}\u{672c}\u{8a9e}\n\
                       created: 2024-01-15T10:30:00Z\nmodified: 2024-01-15T10:30:00Z\n\
                       description: \"caf\u{e9}\"\n---\n\u{3b1}\u{3b2}\u{3b3}\n";
        let parsed = parse(content).unwrap();
        assert_eq!(parsed.note.title(), "\u{65e5}\u{672c}\u{8a9e}");
        assert_eq!(parsed.note.description(), Some("caf\u{e9}"));
        assert_eq!(parsed.body, "\u{3b1}\u{3b2}\u{3b3}\n");
    }
}
