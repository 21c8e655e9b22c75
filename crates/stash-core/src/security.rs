//! Extraction path hardening

use crate::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Joins an archive entry name onto the extraction root, rejecting any
/// name that could land outside it. Parent components, absolute paths and
/// drive prefixes all fail with `Error::PathTraversal`; `.` components are
/// dropped.
pub fn safe_join(root: &Path, name: &Path) -> Result<PathBuf> {
    let mut target = root.to_path_buf();
    for component in name.components() {
        match component {
            Component::Normal(part) => target.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(Error::PathTraversal(name.to_path_buf()));
            }
        }
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_join_under_the_root() {
        let joined = safe_join(Path::new("/out"), Path::new("a/b.txt")).unwrap();
        assert_eq!(joined, PathBuf::from("/out/a/b.txt"));
    }

    #[test]
    fn current_dir_components_are_dropped() {
        let joined = safe_join(Path::new("/out"), Path::new("./a/./b.txt")).unwrap();
        assert_eq!(joined, PathBuf::from("/out/a/b.txt"));
    }

    #[test]
    fn parent_components_are_rejected() {
        let err = safe_join(Path::new("/out"), Path::new("../escape.txt")).unwrap_err();
        assert!(matches!(err, Error::PathTraversal(_)));
        let err = safe_join(Path::new("/out"), Path::new("a/../../escape.txt")).unwrap_err();
        assert!(matches!(err, Error::PathTraversal(_)));
    }

    #[test]
    fn absolute_names_are_rejected() {
        let err = safe_join(Path::new("/out"), Path::new("/etc/passwd")).unwrap_err();
        assert!(matches!(err, Error::PathTraversal(_)));
    }

    #[test]
    fn interior_parent_components_cannot_cancel_out() {
        // `a/../b` stays inside the root but is still refused; resolving
        // it would require trusting the archive's arithmetic.
        let err = safe_join(Path::new("/out"), Path::new("a/../b")).unwrap_err();
        assert!(matches!(err, Error::PathTraversal(_)));
    }
}
