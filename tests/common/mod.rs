//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod harness;

use std::path::{Path, PathBuf};

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

pub fn valid_fixture(name: &str) -> PathBuf {
    fixtures_dir().join("valid").join(name)
}

pub fn invalid_fixture(name: &str) -> PathBuf {
    fixtures_dir().join("invalid").join(name)
}

/// Reads a fixture file and returns its contents as a string.
///
/// # Panics
///
/// Panics if the file cannot be read.
pub fn read_fixture(path: &Path) -> String {
    std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}
