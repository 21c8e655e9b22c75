//! stash: pack, extract and inspect archives from the command line

mod config;

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::{Parser, Subcommand};
use config::Config;
use stash_core::{
    archive_info, extract, extract_as, list, list_as, pack, pack_as, ArchiveEntry, Error, Format,
    ReadOptions, Selector, WriteOptions,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stash", version, about = "Pack, extract and inspect archives")]
struct Cli {
    /// Print debug detail while running
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Silence everything except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an archive from files and directories
    Pack {
        /// Files or directories to pack
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Archive to create
        #[arg(short, long)]
        output: PathBuf,

        /// Archive format; defaults to what the output name implies
        #[arg(short, long)]
        format: Option<String>,

        /// Compression level; each format has its own default
        #[arg(short, long)]
        level: Option<u32>,

        /// Encrypt contents (zip and 7z only)
        #[arg(short, long)]
        password: Option<String>,

        /// Only pack files whose basename matches this glob
        #[arg(long)]
        include: Option<String>,

        /// Skip files whose basename matches this glob
        #[arg(long)]
        exclude: Option<String>,
    },
    /// Extract an archive
    Extract {
        /// Archive to extract
        archive: PathBuf,

        /// Directory to extract into
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Force a format instead of trusting the file name
        #[arg(short, long)]
        format: Option<String>,

        /// Password for encrypted archives
        #[arg(short, long)]
        password: Option<String>,

        /// Only extract entries matching this glob
        #[arg(long, conflicts_with = "members")]
        select: Option<String>,

        /// Only extract these exact entries
        #[arg(long)]
        members: Vec<String>,
    },
    /// List archive contents
    List {
        archive: PathBuf,

        /// Force a format instead of trusting the file name
        #[arg(short, long)]
        format: Option<String>,

        /// Password for archives with an encrypted index
        #[arg(short, long)]
        password: Option<String>,

        /// Emit entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Summarize an archive: format, entries, sizes, space saved
    Info {
        archive: PathBuf,

        /// Password for archives with an encrypted index
        #[arg(short, long)]
        password: Option<String>,

        /// Emit the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the configuration file location and contents
    Config,
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);
    if let Err(err) = run(cli) {
        error!("{err:#}");
        process::exit(exit_code(&err));
    }
}

fn run(cli: Cli) -> Result<()> {
    let quiet = cli.quiet;
    let config = Config::load_or_default();

    match cli.command {
        Commands::Pack {
            sources,
            output,
            format,
            level,
            password,
            include,
            exclude,
        } => {
            let options = WriteOptions {
                level: level.or(config.default_level),
                password,
                include,
                exclude,
            };
            let chosen =
                choose_format(format.as_deref(), &output, config.default_format.as_deref())?;
            let stats = match chosen {
                Some(format) => pack_as(&sources, &output, format, &options)?,
                None => pack(&sources, &output, &options)?,
            };
            if !quiet {
                println!(
                    "{}: {} entries, {} -> {} ({:.1}% saved)",
                    output.display(),
                    stats.entry_count,
                    human_size(stats.original_size),
                    human_size(stats.compressed_size),
                    stats.ratio
                );
            }
        }
        Commands::Extract {
            archive,
            output,
            format,
            password,
            select,
            members,
        } => {
            let selector = if let Some(pattern) = select {
                Selector::Matching(pattern)
            } else if !members.is_empty() {
                Selector::Members(members)
            } else {
                Selector::All
            };
            let options = ReadOptions { selector, password };
            let stats = match format {
                Some(name) => extract_as(&archive, &output, name.parse::<Format>()?, &options)?,
                None => extract(&archive, &output, &options)?,
            };
            if !quiet {
                println!(
                    "{}: {} file(s), {} written",
                    archive.display(),
                    stats.files_extracted,
                    human_size(stats.bytes_written)
                );
            }
        }
        Commands::List {
            archive,
            format,
            password,
            json,
        } => {
            let entries = match format {
                Some(name) => list_as(&archive, name.parse::<Format>()?, password.as_deref())?,
                None => list(&archive, password.as_deref())?,
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print_entries(&entries);
            }
        }
        Commands::Info {
            archive,
            password,
            json,
        } => {
            let info = archive_info(&archive, password.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Format:      {}", info.format);
                println!("Entries:     {}", info.entry_count);
                println!("Original:    {}", human_size(info.original_size));
                println!("Compressed:  {}", human_size(info.compressed_size));
                println!("Space saved: {:.1}%", info.ratio);
            }
        }
        Commands::Config => {
            let path = config::config_path().context("cannot locate the configuration file")?;
            println!("{}", path.display());
            println!(
                "default_format = {}",
                config.default_format.as_deref().unwrap_or("(unset)")
            );
            println!(
                "default_level  = {}",
                config
                    .default_level
                    .map(|level| level.to_string())
                    .unwrap_or_else(|| "(unset)".to_string())
            );
        }
    }
    Ok(())
}

/// Explicit flag first, then the output filename, then the configured
/// default. `None` leaves detection to the library.
fn choose_format(
    flag: Option<&str>,
    path: &Path,
    configured: Option<&str>,
) -> Result<Option<Format>> {
    if let Some(name) = flag {
        return Ok(Some(name.parse::<Format>()?));
    }
    if Format::from_path(path).is_some() {
        return Ok(None);
    }
    match configured {
        Some(name) => Ok(Some(name.parse::<Format>()?)),
        None => Ok(None),
    }
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_entries(entries: &[ArchiveEntry]) {
    println!("{:>10}  {:>10}  {:<19}  name", "size", "stored", "modified");
    for entry in entries {
        let stored = entry
            .compressed_size
            .map(human_size)
            .unwrap_or_else(|| "-".to_string());
        let modified = entry
            .modified
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>10}  {:>10}  {:<19}  {}",
            human_size(entry.size),
            stored,
            modified,
            entry.name
        );
    }
    let files = entries.iter().filter(|entry| !entry.is_dir).count();
    println!("{} entries, {} files", entries.len(), files);
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Exit codes: 2 for filesystem problems, 3 for bad invocations, 4 for
/// unreadable archives, 5 for password failures.
fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(err) = err.downcast_ref::<Error>() {
        return match err {
            Error::Io(_) | Error::SourceNotFound(_) | Error::DestinationUnwritable { .. } => 2,
            Error::UnsupportedFormat(_)
            | Error::InvalidPath(_)
            | Error::InvalidPattern(_)
            | Error::MissingOptionalCodec(_) => 3,
            Error::CorruptArchive(_) | Error::PathTraversal(_) => 4,
            Error::AuthenticationFailed(_) => 5,
        };
    }
    if err.downcast_ref::<std::io::Error>().is_some() {
        return 2;
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_flag_wins_over_filename_and_config() {
        let chosen = choose_format(Some("zip"), Path::new("out.tar.gz"), Some("7z")).unwrap();
        assert_eq!(chosen, Some(Format::Zip));
    }

    #[test]
    fn recognized_filenames_defer_to_detection() {
        let chosen = choose_format(None, Path::new("out.tar.gz"), Some("zip")).unwrap();
        assert_eq!(chosen, None);
    }

    #[test]
    fn configured_default_covers_unknown_names() {
        let chosen = choose_format(None, Path::new("backup"), Some("tar.gz")).unwrap();
        assert_eq!(chosen, Some(Format::TarGz));
        let chosen = choose_format(None, Path::new("backup"), None).unwrap();
        assert_eq!(chosen, None);
    }

    #[test]
    fn sizes_format_in_binary_units() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KiB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MiB");
    }

    #[test]
    fn command_line_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
