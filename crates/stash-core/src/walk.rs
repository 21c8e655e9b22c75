//! Source tree traversal
//!
//! Walks the paths being packed and yields them in a stable order, so the
//! same inputs always produce the same entry sequence. Entries are named
//! relative to the parent of their source root with `/` separators, which
//! is how they appear inside the archive.

use crate::{Error, Result};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// One filesystem object headed into an archive.
#[derive(Debug, Clone)]
pub struct SourceEntry {
    /// Location on disk.
    pub path: PathBuf,
    /// Slash-separated name the entry will carry inside the archive.
    pub name: String,
    pub is_dir: bool,
    /// File size in bytes, zero for directories.
    pub size: u64,
}

/// Iterator over every entry of one or more source paths. Sources are
/// visited in the order given; directory contents are visited
/// depth-first with siblings sorted by file name. Symlinks are skipped
/// with a warning.
#[derive(Debug)]
pub struct SourceWalk {
    queue: VecDeque<PathBuf>,
    current: Option<(walkdir::IntoIter, PathBuf)>,
}

impl SourceWalk {
    /// Prepares a walk over `sources`, failing up front when any of them
    /// does not exist.
    pub fn new<P: AsRef<Path>>(sources: &[P]) -> Result<Self> {
        let mut queue = VecDeque::with_capacity(sources.len());
        for source in sources {
            let source = source.as_ref();
            if !source.exists() {
                return Err(Error::SourceNotFound(source.to_path_buf()));
            }
            queue.push_back(source.to_path_buf());
        }
        Ok(Self {
            queue,
            current: None,
        })
    }

    fn start_source(&mut self, source: PathBuf) -> Option<Result<SourceEntry>> {
        let meta = match fs::symlink_metadata(&source) {
            Ok(meta) => meta,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Some(Err(Error::SourceNotFound(source)));
            }
            Err(err) => return Some(Err(err.into())),
        };
        if meta.file_type().is_symlink() {
            warn!("skipping symlink {}", source.display());
            return None;
        }
        if meta.is_dir() {
            let base = source.parent().map(Path::to_path_buf).unwrap_or_default();
            let iter = WalkDir::new(&source)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter();
            self.current = Some((iter, base));
            return None;
        }
        let name = match source.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => {
                return Some(Err(Error::InvalidPath(format!(
                    "{} has no file name",
                    source.display()
                ))));
            }
        };
        Some(Ok(SourceEntry {
            path: source,
            name,
            is_dir: false,
            size: meta.len(),
        }))
    }
}

impl Iterator for SourceWalk {
    type Item = Result<SourceEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((iter, base)) = &mut self.current {
                match iter.next() {
                    Some(Ok(dirent)) => {
                        if dirent.file_type().is_symlink() {
                            warn!("skipping symlink {}", dirent.path().display());
                            continue;
                        }
                        let name = entry_name(dirent.path(), base);
                        let (is_dir, size) = if dirent.file_type().is_dir() {
                            (true, 0)
                        } else {
                            match dirent.metadata() {
                                Ok(meta) => (false, meta.len()),
                                Err(err) => return Some(Err(map_walk_error(err))),
                            }
                        };
                        return Some(Ok(SourceEntry {
                            path: dirent.path().to_path_buf(),
                            name,
                            is_dir,
                            size,
                        }));
                    }
                    Some(Err(err)) => return Some(Err(map_walk_error(err))),
                    None => self.current = None,
                }
            } else if let Some(source) = self.queue.pop_front() {
                if let Some(item) = self.start_source(source) {
                    return Some(item);
                }
            } else {
                return None;
            }
        }
    }
}

/// Archive name for `path`: the part below `base`, joined with `/`
/// regardless of platform.
fn entry_name(path: &Path, base: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn map_walk_error(err: walkdir::Error) -> Error {
    if matches!(err.io_error(), Some(io) if io.kind() == std::io::ErrorKind::NotFound) {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        return Error::SourceNotFound(path);
    }
    match err.into_io_error() {
        Some(io) => Error::Io(io),
        None => Error::InvalidPath("cycle while walking source tree".to_string()),
    }
}
