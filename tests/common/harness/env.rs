//! Isolated test environment with temp directory.

#![allow(dead_code)]

use super::{NotedexCommand, TestNote};
use anyhow::Result;
use notedex::index::{IndexBuilder, SqliteIndex};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated test environment: a temporary notes directory plus an empty
/// config home, both removed on drop.
pub struct TestEnv {
    _temp_dir: TempDir,
    notes_dir: PathBuf,
    config_home: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let notes_dir = temp_dir.path().join("notes");
        let config_home = temp_dir.path().join("config");
        std::fs::create_dir_all(&notes_dir).expect("Failed to create notes directory");
        std::fs::create_dir_all(&config_home).expect("Failed to create config directory");
        Self {
            _temp_dir: temp_dir,
            notes_dir,
            config_home,
        }
    }

    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }

    /// Where the CLI stores the index by default.
    pub fn index_path(&self) -> PathBuf {
        self.notes_dir.join(".index").join("notes.db")
    }

    /// Writes `test_note` under the notes root and returns its path.
    pub fn add_note(&self, test_note: &TestNote) -> PathBuf {
        self.write_file(&test_note.filename(), &test_note.to_markdown())
    }

    /// Writes a note into a subdirectory of the notes root.
    pub fn add_note_in(&self, dir: &str, test_note: &TestNote) -> PathBuf {
        let rel = Path::new(dir).join(test_note.filename());
        self.write_file(&rel.to_string_lossy(), &test_note.to_markdown())
    }

    pub fn remove_note(&self, test_note: &TestNote) {
        std::fs::remove_file(self.notes_dir.join(test_note.filename()))
            .expect("Failed to remove note");
    }

    /// Writes an arbitrary file relative to the notes root.
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        self.write_bytes(name, content.as_bytes())
    }

    pub fn write_bytes(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.notes_dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Writes the CLI config file.
    pub fn write_config(&self, toml: &str) {
        let dir = self.config_home.join("notedex");
        std::fs::create_dir_all(&dir).expect("Failed to create config directory");
        std::fs::write(dir.join("config.toml"), toml).expect("Failed to write config");
    }

    /// Opens the default index, without building it.
    pub fn open_index(&self) -> Result<SqliteIndex> {
        Ok(SqliteIndex::open(&self.index_path())?)
    }

    /// Fully rebuilds the default index from the notes directory.
    pub fn build_index(&self) -> Result<SqliteIndex> {
        let mut index = self.open_index()?;
        IndexBuilder::new(&self.notes_dir).full_rebuild(&mut index)?;
        Ok(index)
    }

    /// A command with `--dir` set and the config home isolated.
    pub fn cmd(&self) -> NotedexCommand {
        NotedexCommand::new()
            .config_home(&self.config_home)
            .dir(&self.notes_dir)
    }

    /// A command without `--dir`, for exercising config resolution.
    pub fn cmd_without_dir(&self) -> NotedexCommand {
        NotedexCommand::new().config_home(&self.config_home)
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notedex::index::IndexRepository;
    use notedex::infra::read_note;

    #[test]
    fn test_env_cleanup_on_drop() {
        let path = {
            let env = TestEnv::new();
            env.notes_dir().to_path_buf()
        };
        assert!(!path.exists(), "temp directory should be cleaned up on drop");
    }

    #[test]
    fn test_env_add_note_parseable() {
        let env = TestEnv::new();
        let note = TestNote::new("Parseable Note")
            .topic("software/testing")
            .tag("integration")
            .body("# Test Content\n\nThis is a test.");

        let parsed = read_note(&env.add_note(&note)).expect("Should parse the note");
        assert_eq!(parsed.note, note.to_note());
        assert!(parsed.body.contains("# Test Content"));
    }

    #[test]
    fn test_env_build_index_includes_notes() {
        let env = TestEnv::new();
        env.add_note(&TestNote::new("First Indexed"));
        env.add_note(&TestNote::new("Second Indexed"));

        let index = env.build_index().expect("Should build index");
        let titles: Vec<_> = index
            .list_all()
            .unwrap()
            .iter()
            .map(|n| n.title().to_string())
            .collect();
        assert_eq!(titles, vec!["First Indexed", "Second Indexed"]);
        assert!(env.index_path().exists());
    }
}
