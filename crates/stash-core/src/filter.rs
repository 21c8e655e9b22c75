//! Glob filtering for entries going into an archive
//!
//! Patterns apply to entry basenames only, so `*.log` skips log files
//! at any depth. Exclude always wins over include.

use crate::{Error, Result};
use glob::Pattern;

/// Compiled include/exclude globs applied while packing.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    include: Option<Pattern>,
    exclude: Option<Pattern>,
}

impl EntryFilter {
    /// Compiles the given globs. Returns `Error::InvalidPattern` when a
    /// glob does not parse.
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Result<Self> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// Decides whether a file entry is kept. `name` is the slash-separated
    /// archive name; only its final component is matched.
    pub fn allows(&self, name: &str) -> bool {
        let basename = name.rsplit('/').next().unwrap_or(name);
        if let Some(exclude) = &self.exclude {
            if exclude.matches(basename) {
                return false;
            }
        }
        match &self.include {
            Some(include) => include.matches(basename),
            None => true,
        }
    }
}

fn compile(pattern: Option<&str>) -> Result<Option<Pattern>> {
    pattern
        .map(|p| Pattern::new(p).map_err(|e| Error::InvalidPattern(format!("{p}: {e}"))))
        .transpose()
}
