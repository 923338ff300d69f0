//! Configuration file handling
//!
//! Configuration lives in `<config dir>/tagreaper/config.toml` unless a
//! path is passed with `--config`. A missing file means defaults; command
//! line flags are applied on top of whatever was loaded.

use chrono::Duration;
use policy::RetentionPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to encode config: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{key} = {value} is out of range ({range})")]
    OutOfRange {
        key: &'static str,
        value: u64,
        range: &'static str,
    },
}

/// Full configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub policy: PolicyConfig,
    pub registry: RegistryConfig,
    pub in_use: InUseConfig,
}

/// `[policy]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Images kept per repository, in-use images included
    pub keep_max: usize,
    /// Never delete images younger than this many days (0 = no limit)
    pub min_age_days: u32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let policy = RetentionPolicy::default();
        Self {
            keep_max: policy.keep_max,
            min_age_days: 0,
        }
    }
}

/// `[registry]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Inventory file describing the registry
    pub inventory: PathBuf,
    /// Items requested per listing page
    pub page_size: usize,
    /// Repositories to clean (empty = all)
    pub repositories: Vec<String>,
    /// Identifiers sent per delete call
    pub delete_batch_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            inventory: PathBuf::from("inventory.json"),
            page_size: 100,
            repositories: Vec::new(),
            delete_batch_size: 100,
        }
    }
}

/// `[in_use]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InUseConfig {
    /// Tags that must survive cleanup
    pub tags: Vec<String>,
    /// Files listing in-use tags or image references, one per line
    pub files: Vec<PathBuf>,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub keep_max: Option<usize>,
    pub min_age_days: Option<u32>,
    pub inventory: Option<PathBuf>,
    pub repositories: Vec<String>,
    pub in_use_tags: Vec<String>,
    pub in_use_files: Vec<PathBuf>,
}

impl Config {
    /// Check every value against its valid range
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("policy.keep_max", self.policy.keep_max as u64, 0, 100_000, "0-100,000")?;
        check_range("policy.min_age_days", self.policy.min_age_days as u64, 0, 3650, "0-3650")?;
        check_range("registry.page_size", self.registry.page_size as u64, 1, 1000, "1-1000")?;
        check_range(
            "registry.delete_batch_size",
            self.registry.delete_batch_size as u64,
            1,
            100,
            "1-100",
        )?;
        Ok(())
    }

    /// Apply command line values
    ///
    /// Scalars replace the file value, a non-empty repository list replaces
    /// the configured one, and in-use tags/files are added to it.
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(keep_max) = overrides.keep_max {
            self.policy.keep_max = keep_max;
        }
        if let Some(days) = overrides.min_age_days {
            self.policy.min_age_days = days;
        }
        if let Some(inventory) = &overrides.inventory {
            self.registry.inventory = inventory.clone();
        }
        if !overrides.repositories.is_empty() {
            self.registry.repositories = overrides.repositories.clone();
        }
        self.in_use.tags.extend(overrides.in_use_tags.iter().cloned());
        self.in_use.files.extend(overrides.in_use_files.iter().cloned());
    }

    /// Retention policy described by the `[policy]` section
    pub fn retention_policy(&self) -> RetentionPolicy {
        let policy = RetentionPolicy::new(self.policy.keep_max);
        match self.policy.min_age_days {
            0 => policy,
            days => policy.with_min_age(Duration::days(i64::from(days))),
        }
    }
}

fn check_range(
    key: &'static str,
    value: u64,
    min: u64,
    max: u64,
    range: &'static str,
) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { key, value, range })
    }
}

/// Default config file location
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tagreaper").join("config.toml"))
}

/// Explicit path if given, default location otherwise
pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit.map(Path::to_path_buf).or_else(config_file_path)
}

/// Load and validate a config file, falling back to defaults if it is missing
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    config.validate()?;
    tracing::debug!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Load from an explicit path or the default location
pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    match resolve_path(explicit) {
        Some(path) => load_from(&path),
        None => Ok(Config::default()),
    }
}

/// Write a config file, creating parent directories
pub fn save_to(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let encoded = toml::to_string_pretty(config)?;
    write_file(path, &encoded)
}

/// Write the example config if nothing exists at `path`
///
/// Returns whether a file was created.
pub fn init_if_missing(path: &Path) -> Result<bool, ConfigError> {
    if path.exists() {
        return Ok(false);
    }
    write_file(path, example_config())?;
    Ok(true)
}

fn write_file(path: &Path, contents: &str) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, contents).map_err(write_err)
}

/// Commented example configuration
pub fn example_config() -> &'static str {
    r#"# Tagreaper configuration

[policy]
# Images kept per repository. Images with an in-use tag count toward this
# number but are never deleted. 0 keeps nothing by count. (0-100,000)
keep_max = 10
# Never delete images pushed within this many days. 0 disables. (0-3650)
min_age_days = 0

[registry]
# Registry inventory (JSON). Relative paths resolve from the working directory.
inventory = "inventory.json"
# Items per listing page (1-1000)
page_size = 100
# Repositories to clean. Empty means all.
repositories = []
# Identifiers per delete call (1-100)
delete_batch_size = 100

[in_use]
# Tags referenced by running workloads
tags = []
# Files with one tag or image reference per line (# starts a comment)
files = []
"#
}
