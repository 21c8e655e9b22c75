//! User configuration
//!
//! A small TOML file holding defaults for packing. A missing file or
//! missing fields fall back to built-in behavior, and the file is
//! created with defaults on first use.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Format used when the output name does not imply one.
    pub default_format: Option<String>,
    /// Compression level used when none is given on the command line.
    pub default_level: Option<u32>,
}

impl Config {
    /// Loads the configuration file, writing a default one on first run.
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        if !path.exists() {
            let config = Config::default();
            config.save()?;
            return Ok(config);
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("cannot parse {}", path.display()))
    }

    /// Like [`Config::load`] but degrades to defaults on any failure.
    pub fn load_or_default() -> Self {
        Config::load().unwrap_or_else(|err| {
            warn!("using default configuration: {err:#}");
            Config::default()
        })
    }

    pub fn save(&self) -> Result<()> {
        let path = config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let text = toml::to_string_pretty(self).context("cannot serialize configuration")?;
        fs::write(&path, text).with_context(|| format!("cannot write {}", path.display()))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("no configuration directory on this platform")?;
    Ok(dir.join("stash").join("config.toml"))
}
