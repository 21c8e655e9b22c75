//! Shared helpers for stash tests
//!
//! A scratch directory plus the canned trees and assertions the engine
//! and CLI tests lean on.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub mod assertions;
pub mod fixtures;

/// Temporary directory that cleans up on drop. Setup failures panic,
/// which is what a test wants.
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes a file under the directory, creating parents as needed,
    /// and returns its path.
    pub fn create_file(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, content).expect("write fixture file");
        path
    }

    /// Creates a directory (and parents) under the test directory.
    pub fn create_dir(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(&path).expect("create fixture dir");
        path
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}
