//! Common assertions for stash testing

use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Asserts that two directory trees hold the same entries with the same
/// file contents. Compares paths relative to each root, so the roots
/// themselves may live anywhere.
pub fn assert_dirs_equal(dir1: &Path, dir2: &Path) -> Result<()> {
    let entries1 = collect_relative(dir1)?;
    let entries2 = collect_relative(dir2)?;

    assert_eq!(
        entries1, entries2,
        "tree shape differs between {:?} and {:?}",
        dir1, dir2
    );

    for relative in &entries1 {
        let path1 = dir1.join(relative);
        let path2 = dir2.join(relative);

        assert_eq!(
            path1.is_dir(),
            path2.is_dir(),
            "entry type mismatch for {:?}",
            relative
        );

        if path1.is_file() {
            let content1 = std::fs::read(&path1)?;
            let content2 = std::fs::read(&path2)?;
            assert_eq!(content1, content2, "content mismatch for {:?}", relative);
        }
    }

    Ok(())
}

/// Asserts that a file has specific permission bits (Unix only).
#[cfg(unix)]
pub fn assert_file_permissions(path: &Path, expected: u32) {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path).expect("stat file");
    let mode = metadata.permissions().mode() & 0o777;

    assert_eq!(
        mode, expected,
        "permission mismatch for {:?}: expected {:o}, got {:o}",
        path, expected, mode
    );
}

fn collect_relative(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.path() == dir {
            continue;
        }
        entries.push(entry.path().strip_prefix(dir)?.to_path_buf());
    }
    entries.sort();
    Ok(entries)
}
