//! Archive format identification
//!
//! Formats are decided by the caller or by filename suffix, never by
//! sniffing archive contents. Compound suffixes win over their simple
//! tails, so `backup.tar.gz` is a gzipped tarball rather than a bare
//! gzip stream.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Every container and compression format the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    #[serde(rename = "zip")]
    Zip,
    #[serde(rename = "tar")]
    Tar,
    #[serde(rename = "tar.gz")]
    TarGz,
    #[serde(rename = "tar.bz2")]
    TarBz2,
    #[serde(rename = "tar.xz")]
    TarXz,
    #[serde(rename = "gz")]
    Gzip,
    #[serde(rename = "bz2")]
    Bzip2,
    #[serde(rename = "xz")]
    Xz,
    #[serde(rename = "7z")]
    SevenZ,
}

/// Suffix table, longest suffixes first so compound extensions are
/// matched before their tails.
const SUFFIXES: &[(&str, Format)] = &[
    (".tar.bz2", Format::TarBz2),
    (".tar.gz", Format::TarGz),
    (".tar.xz", Format::TarXz),
    (".tbz2", Format::TarBz2),
    (".tgz", Format::TarGz),
    (".txz", Format::TarXz),
    (".bz2", Format::Bzip2),
    (".tar", Format::Tar),
    (".zip", Format::Zip),
    (".gz", Format::Gzip),
    (".xz", Format::Xz),
    (".7z", Format::SevenZ),
];

impl Format {
    /// Resolves a format from a filename, or `None` when no known suffix
    /// matches. Only the final path component is examined, and matching is
    /// case-insensitive.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        let name = path.as_ref().file_name()?.to_str()?.to_ascii_lowercase();
        SUFFIXES
            .iter()
            .find(|(suffix, _)| name.ends_with(suffix))
            .map(|(_, format)| *format)
    }

    /// True for formats that hold exactly one compressed stream rather
    /// than a table of entries.
    pub fn is_single_file(self) -> bool {
        matches!(self, Format::Gzip | Format::Bzip2 | Format::Xz)
    }

    /// True for the formats that can encrypt their contents.
    pub fn supports_password(self) -> bool {
        matches!(self, Format::Zip | Format::SevenZ)
    }

    /// Compression level used when the caller does not pick one.
    pub fn default_level(self) -> u32 {
        match self {
            Format::Bzip2 | Format::TarBz2 => 9,
            Format::SevenZ => 5,
            _ => 6,
        }
    }

    /// Whether the codec for this format was compiled in. Always true
    /// except for 7z without the `sevenz` feature.
    pub fn available(self) -> bool {
        match self {
            Format::SevenZ => cfg!(feature = "sevenz"),
            _ => true,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Zip => "zip",
            Format::Tar => "tar",
            Format::TarGz => "tar.gz",
            Format::TarBz2 => "tar.bz2",
            Format::TarXz => "tar.xz",
            Format::Gzip => "gz",
            Format::Bzip2 => "bz2",
            Format::Xz => "xz",
            Format::SevenZ => "7z",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "zip" => Ok(Format::Zip),
            "tar" => Ok(Format::Tar),
            "tar.gz" | "tgz" => Ok(Format::TarGz),
            "tar.bz2" | "tbz2" => Ok(Format::TarBz2),
            "tar.xz" | "txz" => Ok(Format::TarXz),
            "gz" | "gzip" => Ok(Format::Gzip),
            "bz2" | "bzip2" => Ok(Format::Bzip2),
            "xz" => Ok(Format::Xz),
            "7z" | "7zip" => Ok(Format::SevenZ),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}
