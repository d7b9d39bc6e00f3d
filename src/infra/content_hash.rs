//! SHA-256 digests of raw note bytes.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lowercase hex SHA-256 of a file's exact bytes on disk.
///
/// Hashing happens before BOM stripping or UTF-8 decoding, so any byte-level
/// edit registers as a change. Modification times are never consulted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContentHash(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentHashError {
    #[error("content hash must be 64 hex characters, got {0}")]
    InvalidLength(usize),

    #[error("content hash has non-hex character '{character}' at {position}")]
    InvalidCharacter { position: usize, character: char },
}

impl ContentHash {
    pub fn compute(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(bytes)))
    }

    /// Parses a stored hex digest, normalizing to lowercase.
    pub fn from_hex(hex: &str) -> Result<Self, ContentHashError> {
        if hex.len() != 64 {
            return Err(ContentHashError::InvalidLength(hex.len()));
        }
        if let Some((position, character)) =
            hex.chars().enumerate().find(|(_, c)| !c.is_ascii_hexdigit())
        {
            return Err(ContentHashError::InvalidCharacter {
                position,
                character,
            });
        }
        Ok(Self(hex.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ContentHash {
    type Err = ContentHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
