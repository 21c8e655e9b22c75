//! Single-stream codecs: gzip, bzip2 and xz
//!
//! These wrap exactly one file in a compression stream. There is no
//! entry table, so directories and multiple sources are input errors
//! and include/exclude globs do not apply.

use crate::stats::{ArchiveStats, StatsCollector};
use crate::{Error, Format, Result};
use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use xz2::read::XzDecoder;
use xz2::write::XzEncoder;

use super::{map_read_error, open_archive, ArchiveEntry, ExtractStats};

/// Which compression stream to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleCodec {
    Gzip,
    Bzip2,
    Xz,
}

impl SingleCodec {
    pub fn format(self) -> Format {
        match self {
            SingleCodec::Gzip => Format::Gzip,
            SingleCodec::Bzip2 => Format::Bzip2,
            SingleCodec::Xz => Format::Xz,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            SingleCodec::Gzip => ".gz",
            SingleCodec::Bzip2 => ".bz2",
            SingleCodec::Xz => ".xz",
        }
    }
}

/// Compresses one file into `destination`.
pub fn write_single(
    sources: &[PathBuf],
    destination: &Path,
    codec: SingleCodec,
    level: u32,
) -> Result<ArchiveStats> {
    let source = single_source(sources, codec)?;
    let mut input = BufReader::new(File::open(source)?);
    let output = File::create(destination).map_err(|err| Error::DestinationUnwritable {
        path: destination.to_path_buf(),
        source: err,
    })?;

    let original = match codec {
        SingleCodec::Gzip => {
            let mut encoder = GzEncoder::new(output, flate2::Compression::new(level));
            let copied = io::copy(&mut input, &mut encoder)?;
            encoder.finish()?;
            copied
        }
        SingleCodec::Bzip2 => {
            let mut encoder = BzEncoder::new(output, bzip2::Compression::new(level));
            let copied = io::copy(&mut input, &mut encoder)?;
            encoder.finish()?;
            copied
        }
        SingleCodec::Xz => {
            let mut encoder = XzEncoder::new(output, level);
            let copied = io::copy(&mut input, &mut encoder)?;
            encoder.finish()?;
            copied
        }
    };

    let mut collector = StatsCollector::new();
    collector.record(original);
    let compressed_size = fs::metadata(destination)?.len();
    Ok(collector.finish(codec.format(), compressed_size))
}

/// Decompresses `archive` into the `destination` directory. The output
/// file drops the codec suffix, or gains `.out` when there is none to
/// drop.
pub fn read_single(archive: &Path, destination: &Path, codec: SingleCodec) -> Result<ExtractStats> {
    let file = open_archive(archive)?;
    fs::create_dir_all(destination)?;
    let target = destination.join(output_name(archive, codec));

    let reader = BufReader::new(file);
    let mut decoder: Box<dyn Read> = match codec {
        SingleCodec::Gzip => Box::new(GzDecoder::new(reader)),
        SingleCodec::Bzip2 => Box::new(BzDecoder::new(reader)),
        SingleCodec::Xz => Box::new(XzDecoder::new(reader)),
    };
    let mut output = File::create(&target)?;
    let written = match io::copy(&mut decoder, &mut output) {
        Ok(written) => written,
        Err(err) => {
            // Never leave a half-extracted file behind.
            drop(output);
            let _ = fs::remove_file(&target);
            return Err(map_read_error(err));
        }
    };
    Ok(ExtractStats {
        files_extracted: 1,
        bytes_written: written,
    })
}

/// A single-stream archive lists as one synthetic entry. The
/// uncompressed size comes from decoding to a sink; only gzip carries a
/// timestamp in its header.
pub fn list_single(archive: &Path, codec: SingleCodec) -> Result<Vec<ArchiveEntry>> {
    let file = open_archive(archive)?;
    let compressed_size = file.metadata()?.len();
    let reader = BufReader::new(file);

    let (size, modified) = match codec {
        SingleCodec::Gzip => {
            let mut decoder = GzDecoder::new(reader);
            let size = io::copy(&mut decoder, &mut io::sink()).map_err(map_read_error)?;
            // A zero mtime means the writer recorded none.
            let modified = decoder
                .header()
                .map(|header| header.mtime())
                .filter(|&mtime| mtime != 0)
                .map(i64::from);
            (size, modified)
        }
        SingleCodec::Bzip2 => {
            let mut decoder = BzDecoder::new(reader);
            let size = io::copy(&mut decoder, &mut io::sink()).map_err(map_read_error)?;
            (size, None)
        }
        SingleCodec::Xz => {
            let mut decoder = XzDecoder::new(reader);
            let size = io::copy(&mut decoder, &mut io::sink()).map_err(map_read_error)?;
            (size, None)
        }
    };

    Ok(vec![ArchiveEntry {
        name: output_name(archive, codec),
        size,
        compressed_size: Some(compressed_size),
        mode: None,
        modified,
        is_dir: false,
    }])
}

fn single_source(sources: &[PathBuf], codec: SingleCodec) -> Result<&Path> {
    let source = match sources {
        [source] => source.as_path(),
        [] => return Err(Error::InvalidPath("no source given".to_string())),
        _ => {
            return Err(Error::InvalidPath(format!(
                "{} compresses a single file, got {} sources",
                codec.format(),
                sources.len()
            )))
        }
    };
    let meta = fs::metadata(source).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => Error::SourceNotFound(source.to_path_buf()),
        _ => Error::Io(err),
    })?;
    if meta.is_dir() {
        return Err(Error::InvalidPath(format!(
            "{} compresses a single file; {} is a directory",
            codec.format(),
            source.display()
        )));
    }
    Ok(source)
}

/// Output filename for a decompressed archive, suffix matching done
/// case-insensitively.
fn output_name(archive: &Path, codec: SingleCodec) -> String {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    let suffix = codec.suffix();
    let lower = name.to_ascii_lowercase();
    if lower.len() > suffix.len() && lower.ends_with(suffix) {
        name[..name.len() - suffix.len()].to_string()
    } else {
        format!("{name}.out")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stash_testing::TestDir;

    #[test]
    fn output_names_drop_the_codec_suffix() {
        let name = |path: &str, codec| output_name(Path::new(path), codec);
        assert_eq!(name("backup.gz", SingleCodec::Gzip), "backup");
        assert_eq!(name("DATA.GZ", SingleCodec::Gzip), "DATA");
        assert_eq!(name("notes.txt.bz2", SingleCodec::Bzip2), "notes.txt");
        assert_eq!(name("dump.xz", SingleCodec::Xz), "dump");
        assert_eq!(name("plain", SingleCodec::Gzip), "plain.out");
        assert_eq!(name("wrong.bz2", SingleCodec::Gzip), "wrong.bz2.out");
    }

    #[test]
    fn gzip_round_trip_restores_the_bytes() {
        let dir = TestDir::new();
        let source = dir.create_file("report.csv", b"a,b,c\n1,2,3\n");
        let archive = dir.path().join("report.csv.gz");
        let stats = write_single(&[source], &archive, SingleCodec::Gzip, 6).unwrap();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.original_size, 12);

        let out = dir.path().join("out");
        let extracted = read_single(&archive, &out, SingleCodec::Gzip).unwrap();
        assert_eq!(extracted.files_extracted, 1);
        assert_eq!(extracted.bytes_written, 12);
        assert_eq!(fs::read(out.join("report.csv")).unwrap(), b"a,b,c\n1,2,3\n");
    }

    #[test]
    fn directory_sources_are_an_input_error() {
        let dir = TestDir::new();
        dir.create_file("data/a.txt", b"a");
        let err = write_single(
            &[dir.path().join("data")],
            &dir.path().join("data.gz"),
            SingleCodec::Gzip,
            6,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
    }

    #[test]
    fn multiple_sources_are_an_input_error() {
        let dir = TestDir::new();
        let a = dir.create_file("a.txt", b"a");
        let b = dir.create_file("b.txt", b"b");
        let err = write_single(
            &[a, b],
            &dir.path().join("both.xz"),
            SingleCodec::Xz,
            6,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
    }

    #[test]
    fn listing_reports_one_synthetic_entry() {
        let dir = TestDir::new();
        let source = dir.create_file("notes.txt", b"some notes worth keeping");
        let archive = dir.path().join("notes.txt.bz2");
        write_single(&[source], &archive, SingleCodec::Bzip2, 9).unwrap();

        let entries = list_single(&archive, SingleCodec::Bzip2).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "notes.txt");
        assert_eq!(entries[0].size, 24);
        assert!(entries[0].compressed_size.unwrap() > 0);
        assert!(!entries[0].is_dir);
    }
}
