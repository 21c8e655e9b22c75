//! 7z archives with optional AES-256 encryption
//!
//! Compiled in through the `sevenz` feature. Contents are LZMA2
//! compressed; when a password is given an AES layer runs in front of
//! it, so entry names stay readable but data does not.

use crate::filter::EntryFilter;
use crate::security::safe_join;
use crate::stats::{ArchiveStats, StatsCollector};
use crate::walk::SourceWalk;
use crate::{Error, Format, Result};
use sevenz_rust::lzma::LZMA2Options;
use sevenz_rust::{
    AesEncoderOptions, Password, SevenZArchiveEntry, SevenZMethodConfiguration, SevenZReader,
    SevenZWriter,
};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{map_read_error, open_archive, ArchiveEntry, CompiledSelector, ExtractStats, Selector};

/// Writes `sources` into a 7z archive at `destination`.
pub fn write_sevenz(
    sources: &[PathBuf],
    destination: &Path,
    level: u32,
    password: Option<&str>,
    filter: &EntryFilter,
) -> Result<ArchiveStats> {
    let walk = SourceWalk::new(sources)?;
    let mut writer =
        SevenZWriter::create(destination).map_err(|err| Error::DestinationUnwritable {
            path: destination.to_path_buf(),
            source: io::Error::new(io::ErrorKind::Other, err.to_string()),
        })?;

    let mut methods: Vec<SevenZMethodConfiguration> = Vec::new();
    if let Some(password) = password {
        methods.push(AesEncoderOptions::new(Password::from(password)).into());
    }
    methods.push(LZMA2Options::with_preset(level).into());
    writer.set_content_methods(methods);

    let mut collector = StatsCollector::new();
    for entry in walk {
        let entry = entry?;
        if entry.is_dir {
            let mut dir_entry = SevenZArchiveEntry::default();
            dir_entry.name = entry.name.clone();
            dir_entry.is_directory = true;
            writer
                .push_archive_entry::<&[u8]>(dir_entry, None)
                .map_err(write_failure)?;
            continue;
        }
        if !filter.allows(&entry.name) {
            debug!("filtered out {}", entry.name);
            continue;
        }
        let file = File::open(&entry.path)?;
        writer
            .push_archive_entry(
                SevenZArchiveEntry::from_path(&entry.path, entry.name.clone()),
                Some(file),
            )
            .map_err(write_failure)?;
        collector.record(entry.size);
    }
    writer.finish().map_err(write_failure)?;

    let compressed_size = fs::metadata(destination)?.len();
    Ok(collector.finish(Format::SevenZ, compressed_size))
}

/// Unpacks a 7z archive into `destination`.
pub fn read_sevenz(
    archive: &Path,
    destination: &Path,
    password: Option<&str>,
    selector: &Selector,
) -> Result<ExtractStats> {
    let selector = selector.compile()?;
    let mut reader = open_sevenz(archive, password)?;
    fs::create_dir_all(destination)?;

    let mut stats = ExtractStats::default();
    let mut failure: Option<Error> = None;
    reader
        .for_each_entries(|entry, entry_reader| {
            match extract_entry(entry, entry_reader, destination, &selector, &mut stats) {
                Ok(()) => Ok(true),
                Err(err) => {
                    failure = Some(err);
                    Ok(false)
                }
            }
        })
        .map_err(|err| map_sevenz_error(archive, err))?;
    if let Some(err) = failure {
        return Err(err);
    }
    Ok(stats)
}

/// Lists 7z entries without decompressing their contents. An encrypted
/// header still needs the password.
pub fn list_sevenz(archive: &Path, password: Option<&str>) -> Result<Vec<ArchiveEntry>> {
    let mut reader = open_sevenz(archive, password)?;

    let mut entries = Vec::new();
    reader
        .for_each_entries(|entry, _reader| {
            entries.push(ArchiveEntry {
                name: entry.name().to_string(),
                size: entry.size,
                compressed_size: Some(entry.compressed_size),
                mode: None,
                modified: if entry.has_last_modified_date {
                    Some(entry.last_modified_date.to_unix_time())
                } else {
                    None
                },
                is_dir: entry.is_directory(),
            });
            Ok(true)
        })
        .map_err(|err| map_sevenz_error(archive, err))?;
    Ok(entries)
}

fn open_sevenz(archive: &Path, password: Option<&str>) -> Result<SevenZReader<File>> {
    let file = open_archive(archive)?;
    let len = file.metadata()?.len();
    let password = match password {
        Some(password) => Password::from(password),
        None => Password::empty(),
    };
    SevenZReader::new(file, len, password).map_err(|err| map_sevenz_error(archive, err))
}

fn extract_entry(
    entry: &SevenZArchiveEntry,
    reader: &mut dyn Read,
    destination: &Path,
    selector: &CompiledSelector,
    stats: &mut ExtractStats,
) -> Result<()> {
    let name = entry.name();
    if !selector.selects(name) {
        return Ok(());
    }
    let target = safe_join(destination, Path::new(name))?;
    if entry.is_directory() {
        fs::create_dir_all(&target)?;
        return Ok(());
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut output = File::create(&target)?;
    let written = match io::copy(reader, &mut output) {
        Ok(written) => written,
        Err(err) => {
            // Never leave a half-extracted file behind.
            drop(output);
            let _ = fs::remove_file(&target);
            return Err(map_read_error(err));
        }
    };
    stats.files_extracted += 1;
    stats.bytes_written += written;
    Ok(())
}

fn map_sevenz_error(archive: &Path, err: sevenz_rust::Error) -> Error {
    match err {
        sevenz_rust::Error::PasswordRequired | sevenz_rust::Error::MaybeBadPassword(_) => {
            Error::AuthenticationFailed(archive.to_path_buf())
        }
        other => Error::CorruptArchive(other.to_string()),
    }
}

/// Failures while producing a 7z are IO problems, not archive
/// corruption.
fn write_failure<E: std::fmt::Display>(err: E) -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::Other,
        format!("7z write: {err}"),
    ))
}
