//! Time-sortable note identifier backed by a ULID.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use ulid::Ulid;

/// Unique, immutable identifier of a note.
///
/// Rendered as a 26-character Crockford Base32 ULID. Lexicographic order of
/// the string form follows creation time, so ids can be sorted directly.
///
/// ```
/// use notedex::domain::NoteId;
///
/// let id: NoteId = "01HQ3K5M7NXJK4QZPW8V2R6T9Y".parse().unwrap();
/// assert_eq!(id.prefix(), "01HQ3K5M7N");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(Ulid);

impl NoteId {
    /// Creates a fresh id stamped with the current time.
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Creates an id whose timestamp component is `datetime`.
    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        let system_time: SystemTime = datetime.into();
        Self(Ulid::from_datetime(system_time))
    }

    /// Creates an id from a millisecond Unix timestamp.
    ///
    /// The random component is still random; only ordering is deterministic.
    pub fn from_timestamp_ms(millis: u64) -> Self {
        let system_time = UNIX_EPOCH + Duration::from_millis(millis);
        Self(Ulid::from_datetime(system_time))
    }

    /// Creates an id from an explicit timestamp and random component.
    ///
    /// Both halves are taken as given, so equal inputs give equal ids.
    pub fn from_parts(millis: u64, random: u128) -> Self {
        Self(Ulid::from_parts(millis, random))
    }

    /// First 10 characters, the full 48-bit millisecond timestamp.
    ///
    /// Short enough for display, unique for notes created at different times.
    pub fn prefix(&self) -> String {
        self.0.to_string()[..10].to_string()
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NoteId(\"{}\")", self.0)
    }
}

/// Error returned when a string is not a valid ULID.
#[derive(Debug, Clone)]
pub struct ParseNoteIdError {
    value: String,
    reason: String,
}

impl ParseNoteIdError {
    /// The rejected input.
    pub fn invalid_value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for ParseNoteIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid note id '{}': {}", self.value, self.reason)
    }
}

impl std::error::Error for ParseNoteIdError {}

impl FromStr for NoteId {
    type Err = ParseNoteIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s.trim())
            .map(NoteId)
            .map_err(|e| ParseNoteIdError {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl Serialize for NoteId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for NoteId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
