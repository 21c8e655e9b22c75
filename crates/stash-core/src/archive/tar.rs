//! Tar archives, plain or behind a gzip, bzip2 or xz stream
//!
//! The tar layer is identical for all four variants; only the writer or
//! reader the tar stream runs through differs. Entries keep their Unix
//! permissions and modification times.

use crate::filter::EntryFilter;
use crate::security::safe_join;
use crate::stats::{ArchiveStats, StatsCollector};
use crate::walk::SourceWalk;
use crate::{Error, Format, Result};
use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use xz2::read::XzDecoder;
use xz2::write::XzEncoder;

use super::{map_read_error, open_archive, ArchiveEntry, ExtractStats, Selector};

/// Compression wrapped around the tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TarCompression {
    None,
    Gzip,
    Bzip2,
    Xz,
}

impl TarCompression {
    pub fn format(self) -> Format {
        match self {
            TarCompression::None => Format::Tar,
            TarCompression::Gzip => Format::TarGz,
            TarCompression::Bzip2 => Format::TarBz2,
            TarCompression::Xz => Format::TarXz,
        }
    }
}

/// Writes `sources` into a tar archive at `destination`.
pub fn write_tar(
    sources: &[PathBuf],
    destination: &Path,
    compression: TarCompression,
    level: u32,
    filter: &EntryFilter,
) -> Result<ArchiveStats> {
    let walk = SourceWalk::new(sources)?;
    let file = File::create(destination).map_err(|source| Error::DestinationUnwritable {
        path: destination.to_path_buf(),
        source,
    })?;

    let collector = match compression {
        TarCompression::None => {
            let mut builder = tar::Builder::new(file);
            let collector = append_entries(&mut builder, walk, filter)?;
            builder.finish()?;
            collector
        }
        TarCompression::Gzip => {
            let encoder = GzEncoder::new(file, flate2::Compression::new(level));
            let mut builder = tar::Builder::new(encoder);
            let collector = append_entries(&mut builder, walk, filter)?;
            builder.into_inner()?.finish()?;
            collector
        }
        TarCompression::Bzip2 => {
            let encoder = BzEncoder::new(file, bzip2::Compression::new(level));
            let mut builder = tar::Builder::new(encoder);
            let collector = append_entries(&mut builder, walk, filter)?;
            builder.into_inner()?.finish()?;
            collector
        }
        TarCompression::Xz => {
            let encoder = XzEncoder::new(file, level);
            let mut builder = tar::Builder::new(encoder);
            let collector = append_entries(&mut builder, walk, filter)?;
            builder.into_inner()?.finish()?;
            collector
        }
    };

    let compressed_size = fs::metadata(destination)?.len();
    Ok(collector.finish(compression.format(), compressed_size))
}

/// Streams every walked entry into the tar. Directories are recorded so
/// empty ones survive; files pass the filter first.
fn append_entries<W: Write>(
    builder: &mut tar::Builder<W>,
    walk: SourceWalk,
    filter: &EntryFilter,
) -> Result<StatsCollector> {
    let mut collector = StatsCollector::new();
    for entry in walk {
        let entry = entry?;
        if entry.is_dir {
            builder.append_dir(&entry.name, &entry.path)?;
        } else {
            if !filter.allows(&entry.name) {
                debug!("filtered out {}", entry.name);
                continue;
            }
            builder.append_path_with_name(&entry.path, &entry.name)?;
            collector.record(entry.size);
        }
    }
    Ok(collector)
}

/// Unpacks a tar archive into `destination`. Symlink and hard link
/// entries are skipped rather than trusted.
pub fn read_tar(
    archive: &Path,
    destination: &Path,
    compression: TarCompression,
    selector: &Selector,
) -> Result<ExtractStats> {
    let selector = selector.compile()?;
    let file = open_archive(archive)?;
    let reader = decoder(compression, file);
    fs::create_dir_all(destination)?;

    let mut tar = tar::Archive::new(reader);
    tar.set_preserve_permissions(true);
    tar.set_preserve_mtime(true);

    let mut stats = ExtractStats::default();
    for entry in tar.entries().map_err(map_tar_error)? {
        let mut entry = entry.map_err(map_tar_error)?;
        let name = entry
            .path()
            .map_err(map_tar_error)?
            .to_string_lossy()
            .into_owned();
        let kind = entry.header().entry_type();
        if kind.is_hard_link() || kind.is_symlink() {
            warn!("skipping link entry {}", name);
            continue;
        }
        if !selector.selects(&name) {
            continue;
        }

        let target = safe_join(destination, Path::new(&name))?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let size = entry.size();
        if let Err(err) = entry.unpack(&target) {
            // Never leave a half-extracted file behind.
            let _ = fs::remove_file(&target);
            return Err(map_tar_error(err));
        }
        if !kind.is_dir() {
            stats.files_extracted += 1;
            stats.bytes_written += size;
        }
    }
    Ok(stats)
}

/// Lists tar entries. Per-entry compressed sizes are unknown because the
/// whole stream is compressed as one unit.
pub fn list_tar(archive: &Path, compression: TarCompression) -> Result<Vec<ArchiveEntry>> {
    let file = open_archive(archive)?;
    let reader = decoder(compression, file);
    let mut tar = tar::Archive::new(reader);

    let mut entries = Vec::new();
    for entry in tar.entries().map_err(map_tar_error)? {
        let entry = entry.map_err(map_tar_error)?;
        let name = entry
            .path()
            .map_err(map_tar_error)?
            .to_string_lossy()
            .into_owned();
        let header = entry.header();
        entries.push(ArchiveEntry {
            name,
            size: entry.size(),
            compressed_size: None,
            mode: header.mode().ok(),
            modified: header.mtime().ok().map(|mtime| mtime as i64),
            is_dir: header.entry_type().is_dir(),
        });
    }
    Ok(entries)
}

fn decoder(compression: TarCompression, file: File) -> Box<dyn Read> {
    let reader = BufReader::new(file);
    match compression {
        TarCompression::None => Box::new(reader),
        TarCompression::Gzip => Box::new(GzDecoder::new(reader)),
        TarCompression::Bzip2 => Box::new(BzDecoder::new(reader)),
        TarCompression::Xz => Box::new(XzDecoder::new(reader)),
    }
}

/// tar reports malformed headers and bad checksums as `ErrorKind::Other`.
fn map_tar_error(err: std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::Other {
        Error::CorruptArchive(err.to_string())
    } else {
        map_read_error(err)
    }
}
