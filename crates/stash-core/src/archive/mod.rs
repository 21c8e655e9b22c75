//! Archive operations and the codecs behind them
//!
//! The functions here pick the right codec for a [`Format`] and run the
//! operation against it. Callers either name the format explicitly
//! (`pack_as`, `extract_as`, `list_as`) or let the archive's filename
//! decide (`pack`, `extract`, `list`).

pub mod single;
#[cfg(feature = "sevenz")]
pub mod sevenz;
pub mod tar;
pub mod zip;

use crate::filter::EntryFilter;
use crate::stats::ArchiveStats;
use crate::{Error, Format, Result};
use glob::Pattern;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use self::single::SingleCodec;
use self::tar::TarCompression;

/// One entry of an existing archive, as reported by [`list`].
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveEntry {
    /// Slash-separated name inside the archive.
    pub name: String,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Stored size in bytes, for formats that track it per entry.
    pub compressed_size: Option<u64>,
    /// Unix permission bits, when stored.
    pub mode: Option<u32>,
    /// Modification time as Unix seconds, when stored.
    pub modified: Option<i64>,
    pub is_dir: bool,
}

/// Outcome of an extraction.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ExtractStats {
    /// Number of files written to disk.
    pub files_extracted: u64,
    /// Total bytes written.
    pub bytes_written: u64,
}

/// Options for creating an archive.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Compression level. Each format has its own default.
    pub level: Option<u32>,
    /// Encrypt contents. Only zip and 7z accept a password.
    pub password: Option<String>,
    /// Glob a file's basename must match to be packed.
    pub include: Option<String>,
    /// Glob that drops matching files, taking precedence over `include`.
    pub exclude: Option<String>,
}

/// Options for reading an archive.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Which entries to extract.
    pub selector: Selector,
    /// Password for encrypted zip and 7z archives.
    pub password: Option<String>,
}

/// Which entries an extraction touches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selector {
    /// Every entry.
    #[default]
    All,
    /// Entries whose names are in the list.
    Members(Vec<String>),
    /// Entries whose full names match a glob.
    Matching(String),
}

impl Selector {
    pub fn is_all(&self) -> bool {
        matches!(self, Selector::All)
    }

    fn compile(&self) -> Result<CompiledSelector> {
        Ok(match self {
            Selector::All => CompiledSelector::All,
            Selector::Members(names) => CompiledSelector::Members(
                names
                    .iter()
                    .map(|name| name.trim_end_matches('/').to_string())
                    .collect(),
            ),
            Selector::Matching(pattern) => CompiledSelector::Matching(
                Pattern::new(pattern)
                    .map_err(|e| Error::InvalidPattern(format!("{pattern}: {e}")))?,
            ),
        })
    }
}

/// [`Selector`] with its glob parsed. Names are compared without any
/// trailing slash, so `docs` selects a `docs/` entry as well.
#[derive(Debug)]
enum CompiledSelector {
    All,
    Members(HashSet<String>),
    Matching(Pattern),
}

impl CompiledSelector {
    fn selects(&self, name: &str) -> bool {
        let name = name.trim_end_matches('/');
        match self {
            CompiledSelector::All => true,
            CompiledSelector::Members(names) => names.contains(name),
            CompiledSelector::Matching(pattern) => pattern.matches(name),
        }
    }
}

/// Packs `sources` into `destination`, deciding the format from the
/// destination's filename.
pub fn pack<P: AsRef<Path>, Q: AsRef<Path>>(
    sources: &[P],
    destination: Q,
    options: &WriteOptions,
) -> Result<ArchiveStats> {
    let destination = destination.as_ref();
    let format = detect_format(destination)?;
    pack_as(sources, destination, format, options)
}

/// Packs `sources` into `destination` using an explicit format. A failed
/// write removes whatever was written at `destination`.
pub fn pack_as<P: AsRef<Path>, Q: AsRef<Path>>(
    sources: &[P],
    destination: Q,
    format: Format,
    options: &WriteOptions,
) -> Result<ArchiveStats> {
    let destination = destination.as_ref();
    ensure_available(format)?;
    ensure_password_support(format, options.password.as_deref())?;
    let filter = EntryFilter::new(options.include.as_deref(), options.exclude.as_deref())?;
    let level = effective_level(format, options.level);
    let sources: Vec<PathBuf> = sources.iter().map(|s| s.as_ref().to_path_buf()).collect();
    for source in &sources {
        if !source.exists() {
            return Err(Error::SourceNotFound(source.clone()));
        }
    }

    info!(
        "packing {} source(s) into {} as {} (level {})",
        sources.len(),
        destination.display(),
        format,
        level
    );
    prepare_destination(destination)?;
    let result = write_archive(format, &sources, destination, level, options, &filter);
    if result.is_err() {
        // Never leave a partial archive behind.
        let _ = fs::remove_file(destination);
    }
    let stats = result?;
    debug!(
        "wrote {} entries, {} -> {} bytes ({:.1}% saved)",
        stats.entry_count, stats.original_size, stats.compressed_size, stats.ratio
    );
    Ok(stats)
}

/// Extracts `archive` into the `destination` directory, deciding the
/// format from the archive's filename.
pub fn extract<P: AsRef<Path>, Q: AsRef<Path>>(
    archive: P,
    destination: Q,
    options: &ReadOptions,
) -> Result<ExtractStats> {
    let archive = archive.as_ref();
    let format = detect_format(archive)?;
    extract_as(archive, destination, format, options)
}

/// Extracts `archive` into the `destination` directory using an explicit
/// format. The destination is created when missing.
pub fn extract_as<P: AsRef<Path>, Q: AsRef<Path>>(
    archive: P,
    destination: Q,
    format: Format,
    options: &ReadOptions,
) -> Result<ExtractStats> {
    let archive = archive.as_ref();
    let destination = destination.as_ref();
    ensure_available(format)?;
    ensure_password_support(format, options.password.as_deref())?;
    if format.is_single_file() && !options.selector.is_all() {
        return Err(Error::UnsupportedFormat(format!(
            "{format} holds a single stream and has no members to select"
        )));
    }
    let selector = &options.selector;
    let password = options.password.as_deref();

    info!(
        "extracting {} into {} as {}",
        archive.display(),
        destination.display(),
        format
    );
    match format {
        Format::Zip => zip::read_zip(archive, destination, password, selector),
        Format::Tar => tar::read_tar(archive, destination, TarCompression::None, selector),
        Format::TarGz => tar::read_tar(archive, destination, TarCompression::Gzip, selector),
        Format::TarBz2 => tar::read_tar(archive, destination, TarCompression::Bzip2, selector),
        Format::TarXz => tar::read_tar(archive, destination, TarCompression::Xz, selector),
        Format::Gzip => single::read_single(archive, destination, SingleCodec::Gzip),
        Format::Bzip2 => single::read_single(archive, destination, SingleCodec::Bzip2),
        Format::Xz => single::read_single(archive, destination, SingleCodec::Xz),
        #[cfg(feature = "sevenz")]
        Format::SevenZ => sevenz::read_sevenz(archive, destination, password, selector),
        #[cfg(not(feature = "sevenz"))]
        Format::SevenZ => Err(Error::MissingOptionalCodec("7z")),
    }
}

/// Lists the entries of `archive`, deciding the format from its filename.
pub fn list<P: AsRef<Path>>(archive: P, password: Option<&str>) -> Result<Vec<ArchiveEntry>> {
    let archive = archive.as_ref();
    let format = detect_format(archive)?;
    list_as(archive, format, password)
}

/// Lists the entries of `archive` using an explicit format. Zip listings
/// read central directory metadata only, so no password is needed there;
/// 7z archives may need one for an encrypted header.
pub fn list_as<P: AsRef<Path>>(
    archive: P,
    format: Format,
    password: Option<&str>,
) -> Result<Vec<ArchiveEntry>> {
    let archive = archive.as_ref();
    ensure_available(format)?;
    ensure_password_support(format, password)?;
    debug!("listing {} as {}", archive.display(), format);
    match format {
        Format::Zip => zip::list_zip(archive),
        Format::Tar => tar::list_tar(archive, TarCompression::None),
        Format::TarGz => tar::list_tar(archive, TarCompression::Gzip),
        Format::TarBz2 => tar::list_tar(archive, TarCompression::Bzip2),
        Format::TarXz => tar::list_tar(archive, TarCompression::Xz),
        Format::Gzip => single::list_single(archive, SingleCodec::Gzip),
        Format::Bzip2 => single::list_single(archive, SingleCodec::Bzip2),
        Format::Xz => single::list_single(archive, SingleCodec::Xz),
        #[cfg(feature = "sevenz")]
        Format::SevenZ => sevenz::list_sevenz(archive, password),
        #[cfg(not(feature = "sevenz"))]
        Format::SevenZ => Err(Error::MissingOptionalCodec("7z")),
    }
}

/// Summarizes an existing archive without extracting it: entry count,
/// total uncompressed size and on-disk size. Directories do not count as
/// entries.
pub fn archive_info<P: AsRef<Path>>(archive: P, password: Option<&str>) -> Result<ArchiveStats> {
    let archive = archive.as_ref();
    let format = detect_format(archive)?;
    let entries = list_as(archive, format, password)?;
    let compressed_size = fs::metadata(archive)?.len();

    let mut entry_count = 0;
    let mut original_size = 0;
    for entry in entries.iter().filter(|entry| !entry.is_dir) {
        entry_count += 1;
        original_size += entry.size;
    }
    Ok(ArchiveStats::new(
        format,
        entry_count,
        original_size,
        compressed_size,
    ))
}

fn detect_format(path: &Path) -> Result<Format> {
    Format::from_path(path).ok_or_else(|| {
        Error::UnsupportedFormat(format!("no known archive suffix in {}", path.display()))
    })
}

fn ensure_available(format: Format) -> Result<()> {
    if format.available() {
        Ok(())
    } else {
        Err(Error::MissingOptionalCodec("7z"))
    }
}

fn ensure_password_support(format: Format, password: Option<&str>) -> Result<()> {
    if password.is_some() && !format.supports_password() {
        return Err(Error::UnsupportedFormat(format!(
            "{format} archives do not support passwords"
        )));
    }
    Ok(())
}

/// Requested level capped to what the codec accepts.
fn effective_level(format: Format, requested: Option<u32>) -> u32 {
    let level = requested.unwrap_or_else(|| format.default_level());
    match format {
        Format::Bzip2 | Format::TarBz2 => level.clamp(1, 9),
        _ => level.min(9),
    }
}

fn prepare_destination(destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| Error::DestinationUnwritable {
                path: destination.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

fn write_archive(
    format: Format,
    sources: &[PathBuf],
    destination: &Path,
    level: u32,
    options: &WriteOptions,
    filter: &EntryFilter,
) -> Result<ArchiveStats> {
    let password = options.password.as_deref();
    match format {
        Format::Zip => zip::write_zip(sources, destination, level, password, filter),
        Format::Tar => tar::write_tar(sources, destination, TarCompression::None, level, filter),
        Format::TarGz => tar::write_tar(sources, destination, TarCompression::Gzip, level, filter),
        Format::TarBz2 => {
            tar::write_tar(sources, destination, TarCompression::Bzip2, level, filter)
        }
        Format::TarXz => tar::write_tar(sources, destination, TarCompression::Xz, level, filter),
        Format::Gzip => single::write_single(sources, destination, SingleCodec::Gzip, level),
        Format::Bzip2 => single::write_single(sources, destination, SingleCodec::Bzip2, level),
        Format::Xz => single::write_single(sources, destination, SingleCodec::Xz, level),
        #[cfg(feature = "sevenz")]
        Format::SevenZ => sevenz::write_sevenz(sources, destination, level, password, filter),
        #[cfg(not(feature = "sevenz"))]
        Format::SevenZ => Err(Error::MissingOptionalCodec("7z")),
    }
}

/// Opens an archive for reading, turning a missing file into
/// [`Error::SourceNotFound`].
fn open_archive(path: &Path) -> Result<fs::File> {
    fs::File::open(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => Error::SourceNotFound(path.to_path_buf()),
        _ => Error::Io(err),
    })
}

/// Maps IO failures seen while decoding archive contents. Truncated or
/// garbled data surfaces as [`Error::CorruptArchive`]. flate2 and bzip2
/// report bad streams as `InvalidInput`; xz2 has no dedicated kind and
/// needs its inner error inspected.
fn map_read_error(err: std::io::Error) -> Error {
    match err.kind() {
        std::io::ErrorKind::InvalidInput
        | std::io::ErrorKind::InvalidData
        | std::io::ErrorKind::UnexpectedEof => Error::CorruptArchive(err.to_string()),
        _ => {
            if err
                .get_ref()
                .is_some_and(|inner| inner.is::<xz2::stream::Error>())
            {
                Error::CorruptArchive(err.to_string())
            } else {
                Error::Io(err)
            }
        }
    }
}
