//! Archive engine behind the `stash` tool
//!
//! One API over zip, tar (plain, gz, bz2, xz), the bare gzip, bzip2 and
//! xz streams, and optionally 7z. The format is either named explicitly
//! or taken from the archive's filename, extraction never writes outside
//! its destination directory, and every operation reports what it did.
//!
//! # Example
//!
//! ```no_run
//! use stash_core::{pack, WriteOptions};
//!
//! # fn main() -> stash_core::Result<()> {
//! let stats = pack(&["photos"], "photos.tar.gz", &WriteOptions::default())?;
//! println!("{} files, {:.1}% saved", stats.entry_count, stats.ratio);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod error;
pub mod filter;
pub mod format;
pub mod security;
pub mod stats;
pub mod walk;

pub use archive::{
    archive_info, extract, extract_as, list, list_as, pack, pack_as, ArchiveEntry, ExtractStats,
    ReadOptions, Selector, WriteOptions,
};
pub use error::{Error, Result};
pub use filter::EntryFilter;
pub use format::Format;
pub use stats::{ArchiveStats, StatsCollector};
