//! Shared helpers for fsedit CLI tests.

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch directory plus a handle on the compiled binary.
#[allow(dead_code)]
pub struct TestContext {
    root: TempDir,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp directory for tests");
        Self { root }
    }

    pub fn dir(&self) -> &Path {
        self.root.path()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    /// Build a command for the `fsedit` binary running inside the scratch directory.
    pub fn cli(&self) -> Command {
        let mut cmd = Command::cargo_bin("fsedit").expect("Failed to locate fsedit binary");
        cmd.current_dir(self.dir());
        cmd
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content).expect("Failed to write test file");
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path(name)).expect("Failed to read test file")
    }

    /// Backup files created next to `name`.
    pub fn backups_of(&self, name: &str) -> Vec<PathBuf> {
        let prefix = format!("{name}.");
        let mut found: Vec<PathBuf> = fs::read_dir(self.dir())
            .expect("Failed to list test directory")
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix) && n.contains(".backup"))
            })
            .collect();
        found.sort();
        found
    }
}
