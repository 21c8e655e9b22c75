//! Error types for stash-core

use std::path::PathBuf;
use thiserror::Error;

/// Core error types for the stash engine
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Format detection failed, or the operation is invalid for the format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A requested input file, directory, or archive does not exist
    #[error("Source not found: {0}")]
    SourceNotFound(PathBuf),

    /// The destination archive could not be created or written
    #[error("Cannot write {path}: {source}")]
    DestinationUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive payload is truncated or not valid for its format
    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    /// A password was wrong or required but missing
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(PathBuf),

    /// The codec for this format was not compiled in
    #[error("Optional codec unavailable: {0}")]
    MissingOptionalCodec(&'static str),

    /// An archive entry would land outside the extraction directory
    #[error("Entry escapes extraction directory: {0}")]
    PathTraversal(PathBuf),

    /// Invalid file or directory input for the operation
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A filter or selector glob failed to parse
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

pub type Result<T> = std::result::Result<T, Error>;
