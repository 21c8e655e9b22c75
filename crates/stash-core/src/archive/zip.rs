//! Zip archives
//!
//! Files are deflated; directories are stored so empty ones survive a
//! round trip. Passwords use the legacy ZipCrypto scheme, which every
//! mainstream unzip tool can read. Listing only touches the central
//! directory, so it works on encrypted archives without a password.

use crate::filter::EntryFilter;
use crate::security::safe_join;
use crate::stats::{ArchiveStats, StatsCollector};
use crate::walk::SourceWalk;
use crate::{Error, Format, Result};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use zip::result::ZipError;
use zip::unstable::write::FileOptionsExt;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::{map_read_error, open_archive, ArchiveEntry, ExtractStats, Selector};

/// Writes `sources` into a zip archive at `destination`.
pub fn write_zip(
    sources: &[PathBuf],
    destination: &Path,
    level: u32,
    password: Option<&str>,
    filter: &EntryFilter,
) -> Result<ArchiveStats> {
    let walk = SourceWalk::new(sources)?;
    let file = File::create(destination).map_err(|source| Error::DestinationUnwritable {
        path: destination.to_path_buf(),
        source,
    })?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let mut collector = StatsCollector::new();

    for entry in walk {
        let entry = entry?;
        if entry.is_dir {
            let mut options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
            if let Some(mode) = unix_mode(&entry.path) {
                options = options.unix_permissions(mode);
            }
            writer
                .add_directory(entry.name.as_str(), options)
                .map_err(|err| map_zip_error(destination, err))?;
            continue;
        }
        if !filter.allows(&entry.name) {
            continue;
        }

        let mut options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(i64::from(level)));
        if let Some(mode) = unix_mode(&entry.path) {
            options = options.unix_permissions(mode);
        }
        if let Some(password) = password {
            options = options.with_deprecated_encryption(password.as_bytes());
        }
        writer
            .start_file(entry.name.as_str(), options)
            .map_err(|err| map_zip_error(destination, err))?;
        let mut input = File::open(&entry.path)?;
        io::copy(&mut input, &mut writer)?;
        collector.record(entry.size);
    }

    let mut inner = writer
        .finish()
        .map_err(|err| map_zip_error(destination, err))?;
    inner.flush()?;

    let compressed_size = fs::metadata(destination)?.len();
    Ok(collector.finish(Format::Zip, compressed_size))
}

/// Unpacks a zip archive into `destination`, restoring permissions and
/// modification times where the archive carries them.
pub fn read_zip(
    archive: &Path,
    destination: &Path,
    password: Option<&str>,
    selector: &Selector,
) -> Result<ExtractStats> {
    let selector = selector.compile()?;
    let file = open_archive(archive)?;
    let mut zip =
        ZipArchive::new(BufReader::new(file)).map_err(|err| map_zip_error(archive, err))?;
    fs::create_dir_all(destination)?;

    let mut stats = ExtractStats::default();
    for index in 0..zip.len() {
        let mut entry = match password {
            Some(password) => zip.by_index_decrypt(index, password.as_bytes()),
            None => zip.by_index(index),
        }
        .map_err(|err| map_zip_error(archive, err))?;

        let name = entry.name().to_string();
        if !selector.selects(&name) {
            continue;
        }
        let target = safe_join(destination, Path::new(&name))?;
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mode = entry.unix_mode();
        let modified = entry.last_modified().and_then(dos_to_unix);
        let mut output = File::create(&target)?;
        let written = match io::copy(&mut entry, &mut output) {
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
        apply_metadata(&target, mode, modified);
    }
    Ok(stats)
}

/// Lists zip entries from the central directory without decompressing
/// anything.
pub fn list_zip(archive: &Path) -> Result<Vec<ArchiveEntry>> {
    let file = open_archive(archive)?;
    let mut zip =
        ZipArchive::new(BufReader::new(file)).map_err(|err| map_zip_error(archive, err))?;

    let mut entries = Vec::with_capacity(zip.len());
    for index in 0..zip.len() {
        let entry = zip
            .by_index_raw(index)
            .map_err(|err| map_zip_error(archive, err))?;
        entries.push(ArchiveEntry {
            name: entry.name().to_string(),
            size: entry.size(),
            compressed_size: Some(entry.compressed_size()),
            mode: entry.unix_mode(),
            modified: entry.last_modified().and_then(dos_to_unix),
            is_dir: entry.is_dir(),
        });
    }
    Ok(entries)
}

fn map_zip_error(archive: &Path, err: ZipError) -> Error {
    match err {
        ZipError::Io(err) => map_read_error(err),
        ZipError::InvalidPassword => Error::AuthenticationFailed(archive.to_path_buf()),
        ZipError::UnsupportedArchive(msg) if msg.contains("Password") => {
            Error::AuthenticationFailed(archive.to_path_buf())
        }
        other => Error::CorruptArchive(other.to_string()),
    }
}

fn unix_mode(path: &Path) -> Option<u32> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::metadata(path).ok().map(|meta| meta.permissions().mode())
    }
    #[cfg(not(unix))]
    {
        let _ = path;
        None
    }
}

/// Best effort; a file that extracted fine is not failed over metadata.
fn apply_metadata(path: &Path, mode: Option<u32>, modified: Option<i64>) {
    #[cfg(unix)]
    if let Some(mode) = mode {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(mode));
    }
    #[cfg(not(unix))]
    let _ = mode;
    if let Some(seconds) = modified {
        let _ = filetime::set_file_mtime(path, filetime::FileTime::from_unix_time(seconds, 0));
    }
}

/// Zip timestamps are DOS-style civil dates with no zone; they are read
/// here as UTC.
fn dos_to_unix(dt: zip::DateTime) -> Option<i64> {
    let days = days_from_civil(
        i64::from(dt.year()),
        u32::from(dt.month()),
        u32::from(dt.day()),
    )?;
    let seconds =
        i64::from(dt.hour()) * 3600 + i64::from(dt.minute()) * 60 + i64::from(dt.second());
    Some(days * 86_400 + seconds)
}

/// Days since 1970-01-01 for a civil date, `None` when the month or day
/// field is out of range.
fn days_from_civil(year: i64, month: u32, day: u32) -> Option<i64> {
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let mp = (i64::from(month) + 9) % 12;
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    Some(era * 146_097 + doe - 719_468)
}
