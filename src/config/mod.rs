//! Repository configuration (`.minivcs/config`).
//!
//! The file uses an INI-like format with sections and key-value pairs.
//! Section and key names are case-insensitive.
//!
//! Recognised keys:
//!
//! | key                    | default | meaning                                |
//! |------------------------|---------|----------------------------------------|
//! | `core.compressionLevel`| 6       | zlib level (0-10) for new objects      |
//! | `log.abbrev`           | 7       | id digits shown on `Merge:` log lines  |
//!
//! # Example
//!
//! ```
//! use minivcs::config::Config;
//!
//! let config: Config = "[log]\n    abbrev = 10\n".parse().unwrap();
//! assert_eq!(config.log_abbrev().unwrap(), 10);
//! assert_eq!(config.compression_level().unwrap(), 6);
//! ```

mod parser;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::infra::compression::{DEFAULT_LEVEL, MAX_LEVEL};
use crate::infra::read_file;

/// Default number of hex digits shown for merge parents in `log`.
pub const DEFAULT_ABBREV: usize = 7;

/// A parsed configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// section -> key -> value, names lowercased.
    entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl Config {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses configuration from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = read_file(path.as_ref())?;
        let text = String::from_utf8(content)
            .map_err(|_| Error::InvalidConfig("config is not valid UTF-8".to_string()))?;
        text.parse()
    }

    /// Loads the config at `path`, falling back to defaults if the file does
    /// not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match Self::from_file(path) {
            Err(Error::FileNotFound(_)) => Ok(Self::new()),
            other => other,
        }
    }

    /// The config `init` writes into a fresh repository.
    pub fn initial() -> Self {
        let mut config = Self::new();
        config.set("core", "compressionLevel", &DEFAULT_LEVEL.to_string());
        config.set("log", "abbrev", &DEFAULT_ABBREV.to_string());
        config
    }

    /// Gets a raw value.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.entries
            .get(&section.to_lowercase())
            .and_then(|keys| keys.get(&key.to_lowercase()))
            .map(|s| s.as_str())
    }

    /// Gets a value as an integer, honouring `k`/`m`/`g` suffixes. A missing
    /// key yields `None`.
    pub fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>> {
        self.get(section, key).map(parse_int).transpose()
    }

    /// Sets a value.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.entries
            .entry(section.to_lowercase())
            .or_default()
            .insert(key.to_lowercase(), value.to_string());
    }

    /// Returns the zlib level for new objects.
    pub fn compression_level(&self) -> Result<u8> {
        match self.get_int("core", "compressionLevel")? {
            None => Ok(DEFAULT_LEVEL),
            Some(n) if (0..=MAX_LEVEL as i64).contains(&n) => Ok(n as u8),
            Some(n) => Err(Error::InvalidConfig(format!(
                "core.compressionLevel must be between 0 and {}, got {}",
                MAX_LEVEL, n
            ))),
        }
    }

    /// Returns how many id digits `log` shows for merge parents.
    pub fn log_abbrev(&self) -> Result<usize> {
        match self.get_int("log", "abbrev")? {
            None => Ok(DEFAULT_ABBREV),
            Some(n) if (4..=40).contains(&n) => Ok(n as usize),
            Some(n) => Err(Error::InvalidConfig(format!(
                "log.abbrev must be between 4 and 40, got {}",
                n
            ))),
        }
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(content: &str) -> Result<Self> {
        parser::parse(content)
    }
}

/// Renders the config back into file form.
impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (section, keys) in &self.entries {
            writeln!(f, "[{}]", section)?;
            for (key, value) in keys {
                writeln!(f, "\t{} = {}", key, value)?;
            }
        }
        Ok(())
    }
}

fn parse_int(value: &str) -> Result<i64> {
    let value = value.trim();

    let (num_str, multiplier) = if let Some(stripped) = value.strip_suffix(['k', 'K']) {
        (stripped, 1024_i64)
    } else if let Some(stripped) = value.strip_suffix(['m', 'M']) {
        (stripped, 1024_i64 * 1024)
    } else if let Some(stripped) = value.strip_suffix(['g', 'G']) {
        (stripped, 1024_i64 * 1024 * 1024)
    } else {
        (value, 1_i64)
    };

    let num: i64 = num_str
        .trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("invalid integer value: {}", value)))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| Error::InvalidConfig(format!("integer overflow: {}", value)))
}
