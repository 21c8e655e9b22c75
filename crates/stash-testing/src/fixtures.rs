//! Common test fixtures for stash testing

use crate::TestDir;
use anyhow::Result;
use std::path::PathBuf;

/// Creates the small two-file tree most archive tests start from:
/// `data/a.txt` (5 bytes) and `data/sub/b.txt` (5 bytes).
///
/// Returns the path of the `data` directory.
pub fn create_small_tree(test_dir: &TestDir) -> Result<PathBuf> {
    let root = test_dir.create_dir("data");
    test_dir.create_file("data/a.txt", b"aaaaa");
    test_dir.create_file("data/sub/b.txt", b"bbbbb");
    Ok(root)
}

/// Creates a richer directory tree with text, binary, and repetitive
/// content plus an empty directory. Holds six regular files.
///
/// Returns the path of the tree root.
pub fn create_mixed_tree(test_dir: &TestDir) -> Result<PathBuf> {
    let root = test_dir.create_dir("project");
    test_dir.create_file("project/README.md", b"# Test project\n\nFixture tree.");
    test_dir.create_file("project/notes.txt", b"plain text notes");
    test_dir.create_file("project/image.jpg", &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]);

    test_dir.create_file("project/src/main.rs", b"fn main() {}\n");
    test_dir.create_file("project/src/lib.rs", b"pub fn answer() -> u32 { 42 }\n");

    let repetitive = "the quick brown fox jumps over the lazy dog\n".repeat(512);
    test_dir.create_file("project/big.log", repetitive.as_bytes());

    test_dir.create_dir("project/empty");
    Ok(root)
}
