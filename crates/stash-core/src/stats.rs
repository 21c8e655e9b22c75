//! Size accounting for archive operations

use crate::Format;
use serde::Serialize;

/// Summary of a finished archive: how many file entries it holds and how
/// well it compressed.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveStats {
    /// Format the archive was written in.
    pub format: Format,
    /// Number of file entries. Directories are not counted.
    pub entry_count: u64,
    /// Total uncompressed size of all file entries in bytes.
    pub original_size: u64,
    /// Size of the archive on disk in bytes.
    pub compressed_size: u64,
    /// Space saved as a percentage of the original size.
    pub ratio: f64,
}

impl ArchiveStats {
    pub fn new(format: Format, entry_count: u64, original_size: u64, compressed_size: u64) -> Self {
        Self {
            format,
            entry_count,
            original_size,
            compressed_size,
            ratio: compression_ratio(original_size, compressed_size),
        }
    }
}

/// Running totals while entries are written. Call [`StatsCollector::record`]
/// per file and [`StatsCollector::finish`] once the archive is on disk.
#[derive(Debug, Default)]
pub struct StatsCollector {
    entries: u64,
    original: u64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accounts for one file entry of the given uncompressed size.
    pub fn record(&mut self, size: u64) {
        self.entries += 1;
        self.original += size;
    }

    pub fn entry_count(&self) -> u64 {
        self.entries
    }

    pub fn original_size(&self) -> u64 {
        self.original
    }

    /// Seals the totals with the on-disk archive size.
    pub fn finish(self, format: Format, compressed_size: u64) -> ArchiveStats {
        ArchiveStats::new(format, self.entries, self.original, compressed_size)
    }
}

/// Space saved as a percentage, clamped to `[0, 100]`. An empty input
/// reports zero rather than dividing by it.
pub fn compression_ratio(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    let ratio = (1.0 - compressed as f64 / original as f64) * 100.0;
    ratio.max(0.0)
}
