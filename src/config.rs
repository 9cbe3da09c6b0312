//! Persistent configuration for a backup run.
//!
//! The config is a small TOML file holding the source directories, the target directory
//! and the minimum log level. It is read once at startup and never changed afterwards.
//! When the file is missing, [`write_default`] bootstraps one that the operator is
//! expected to edit before the next invocation.

use crate::logger::LogLevel;
use crate::path::{canonical_key, expand_path};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::{fs, io};
use thiserror::Error;

/// Default configuration file name.
pub const CONFIG_NAME: &str = "config.toml";

/// Errors raised while loading or validating the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file '{}' does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Validation(String),
    #[error("failed to write config file '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// The on-disk configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    /// Directories to back up, in the order their `Source<i>` folders are numbered.
    #[serde(default)]
    pub source_directories: Vec<String>,
    /// Directory under which each run creates its timestamped root.
    #[serde(default)]
    pub target_directory: String,
    /// Minimum log level name: `Debug`, `Info` or `Error`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "Info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_directories: DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect(),
            target_directory: DEFAULT_TARGET.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

const DEFAULT_SOURCES: [&str; 2] = [r"C:\Backup\Source1", r"C:\Backup\Source2"];
const DEFAULT_TARGET: &str = r"D:\Backups";
const DEFAULT_LOG_LEVEL: &str = "Debug";

impl Config {
    /// Parses a config from TOML text and validates it.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that there is at least one source, no source or target is blank and no
    /// two sources resolve to the same directory (compared case-insensitively).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_directories.is_empty() {
            return Err(ConfigError::Validation(
                "SourceDirectories must contain at least one directory".to_string(),
            ));
        }
        if self.source_directories.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "SourceDirectories must not contain blank entries".to_string(),
            ));
        }
        if self.target_directory.trim().is_empty() {
            return Err(ConfigError::Validation(
                "TargetDirectory must not be blank".to_string(),
            ));
        }
        let duplicates = self.duplicate_sources();
        if !duplicates.is_empty() {
            return Err(ConfigError::Validation(format!(
                "duplicate source directories: {}",
                duplicates.join(", ")
            )));
        }
        Ok(())
    }

    /// Canonical keys that appear more than once, in order of first appearance.
    fn duplicate_sources(&self) -> Vec<String> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut order = vec![];
        for source in &self.source_directories {
            let key = canonical_key(source);
            let count = counts.entry(key.clone()).or_insert(0);
            if *count == 0 {
                order.push(key);
            }
            *count += 1;
        }
        order.into_iter().filter(|key| counts[key] > 1).collect()
    }

    pub fn level(&self) -> LogLevel {
        LogLevel::parse_lenient(&self.log_level)
    }

    /// Source directories with `~` expanded and relative paths made absolute.
    pub fn sources(&self) -> Vec<PathBuf> {
        self.source_directories
            .iter()
            .map(|s| expand_path(s))
            .collect()
    }

    pub fn target(&self) -> PathBuf {
        expand_path(self.target_directory.trim())
    }
}

/// Loads and validates the config file at `path`.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let toml_str = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Config::parse(&toml_str)
}

/// Writes the default config to `path`, creating the parent directory if needed.
pub fn write_default(path: &Path) -> Result<(), ConfigError> {
    let toml_str = toml::to_string_pretty(&Config::default())?;
    let write = || -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::File::create(path)?;
        let mut writer = io::BufWriter::new(file);
        writer.write_all(toml_str.as_bytes())?;
        writer.flush()
    };
    write().map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Returns the default config location: `config.toml` beside the running executable.
pub fn default_config_file() -> io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().unwrap_or_else(|| Path::new(""));
    Ok(dir.join(CONFIG_NAME))
}
