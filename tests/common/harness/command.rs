//! Fluent wrapper around assert_cmd::Command.

#![allow(dead_code)]

use assert_cmd::Command;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Fluent wrapper around `assert_cmd::Command` for the `notedex` binary.
pub struct NotedexCommand {
    args: Vec<String>,
    config_home: Option<PathBuf>,
}

impl NotedexCommand {
    pub fn new() -> Self {
        Self {
            args: Vec::new(),
            config_home: None,
        }
    }

    /// Sets the `--dir` option to specify the notes directory.
    pub fn dir(mut self, path: &Path) -> Self {
        self.args.push("--dir".to_string());
        self.args.push(path.to_string_lossy().to_string());
        self
    }

    /// Points the config lookup at `path` so the user's real config is never read.
    pub fn config_home(mut self, path: &Path) -> Self {
        self.config_home = Some(path.to_path_buf());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    #[allow(deprecated)]
    pub fn assert(self) -> assert_cmd::assert::Assert {
        let mut cmd = Command::cargo_bin("notedex").expect("Failed to find notedex binary");
        cmd.args(&self.args).env_remove("RUST_LOG");
        if let Some(home) = &self.config_home {
            cmd.env("XDG_CONFIG_HOME", home).env("HOME", home);
        }
        cmd.assert()
    }

    /// Runs the command, expects success, and returns stdout as a string.
    pub fn output_success(self) -> String {
        let output = self.assert().success().get_output().stdout.clone();
        String::from_utf8(output).expect("Output was not valid UTF-8")
    }

    /// Runs the command, expects success, and parses stdout as JSON.
    pub fn output_json<T: DeserializeOwned>(self) -> T {
        let output = self.output_success();
        serde_json::from_str(&output).expect("Failed to parse output as JSON")
    }

    pub fn index(self) -> Self {
        self.args(["index"])
    }

    pub fn with_full(self) -> Self {
        self.args(["--full"])
    }

    pub fn ls(self) -> Self {
        self.args(["ls"])
    }

    pub fn search(self, query: &str) -> Self {
        self.args(["search", query])
    }

    pub fn show(self, note: &str) -> Self {
        self.args(["show", note])
    }

    pub fn backlinks(self, note: &str) -> Self {
        self.args(["backlinks", note])
    }

    pub fn check(self) -> Self {
        self.args(["check"])
    }

    pub fn tags(self) -> Self {
        self.args(["tags"])
    }

    pub fn topics(self) -> Self {
        self.args(["topics"])
    }

    pub fn rels(self) -> Self {
        self.args(["rels"])
    }

    pub fn format_json(self) -> Self {
        self.args(["--format", "json"])
    }

    pub fn format_paths(self) -> Self {
        self.args(["--format", "paths"])
    }
}

impl Default for NotedexCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_runs_binary() {
        NotedexCommand::new().args(["--help"]).assert().success();
    }

    #[test]
    fn test_command_shortcuts() {
        let cmd = NotedexCommand::new().ls().format_json();
        assert_eq!(cmd.get_args(), ["ls", "--format", "json"]);
    }
}
