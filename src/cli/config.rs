//! Configuration file support.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::index::SearchWeights;

/// Application configuration loaded from the config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Default notes directory
    pub dir: Option<PathBuf>,

    /// Index database location; relative paths resolve against the notes
    /// directory
    pub index_path: Option<PathBuf>,

    /// Search ranking weights
    #[serde(default)]
    pub search: SearchWeights,
}

impl Config {
    /// Load configuration from the default config file location.
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            log::debug!("no config at {}", config_path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("failed to read config file: {}", config_path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", config_path.display()))
    }

    /// Default: `~/.config/notedex/config.toml`
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("notedex")
            .join("config.toml")
    }

    /// Resolve the notes directory.
    ///
    /// Precedence order:
    /// 1. CLI `--dir` argument
    /// 2. Config file `dir` setting
    /// 3. Current working directory
    pub fn notes_dir(&self, cli_dir: Option<&PathBuf>) -> PathBuf {
        cli_dir
            .cloned()
            .or_else(|| self.dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Index database for `notes_dir`, `<notes_dir>/.index/notes.db` unless
    /// overridden.
    pub fn index_path(&self, notes_dir: &Path) -> PathBuf {
        match &self.index_path {
            Some(path) => notes_dir.join(path),
            None => notes_dir.join(".index").join("notes.db"),
        }
    }
}
