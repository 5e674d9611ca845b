//! Cache configuration with precedence and validation
//!
//! Values are layered default < config file < environment, and callers (the
//! CLI in particular) apply explicit overrides on top through
//! [`CacheConfigBuilder`].

use crate::errors::{CacheError, RecoveryHint, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Marker selecting an in-memory metadata store
pub const IN_MEMORY_MARKER: &str = ":memory:";

/// Marker selecting a transient on-disk metadata store
pub const TRANSIENT_MARKER: &str = "";

/// Where the metadata store lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataLocation {
    /// A persistent database file
    File(PathBuf),
    /// Lives and dies with the connection
    InMemory,
    /// Anonymous on-disk database removed when the connection closes
    TransientTemp,
}

impl MetadataLocation {
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::File(_))
    }
}

impl FromStr for MetadataLocation {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            IN_MEMORY_MARKER => Self::InMemory,
            TRANSIENT_MARKER => Self::TransientTemp,
            path => Self::File(PathBuf::from(path)),
        })
    }
}

impl From<&str> for MetadataLocation {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(location) => location,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for MetadataLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::InMemory => f.write_str(IN_MEMORY_MARKER),
            Self::TransientTemp => f.write_str("<transient>"),
        }
    }
}

/// Default TTL applied when `set` is not given one
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Default time a stale record stays readable before purge removes it
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(3600);

/// Default largest value stored inline in the metadata store
pub const DEFAULT_INLINE_THRESHOLD: usize = 10 * 1024;

/// Configuration for a [`Cache`](crate::Cache)
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Directory holding blob files
    pub blob_root: PathBuf,
    /// Metadata store location
    pub metadata: MetadataLocation,
    /// TTL used when `set` is called without one
    pub default_ttl: Duration,
    /// Extra time after the TTL before purge removes a record
    pub grace_period: Duration,
    /// Values longer than this many bytes are stored as blobs
    pub inline_threshold: usize,
    /// Bound on unexpired entries; `None` means unbounded
    pub max_entries: Option<NonZeroUsize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let base = default_base_dir();
        Self {
            blob_root: base.join("blobs"),
            metadata: MetadataLocation::File(base.join("metadata.sqlite3")),
            default_ttl: DEFAULT_TTL,
            grace_period: DEFAULT_GRACE_PERIOD,
            inline_threshold: DEFAULT_INLINE_THRESHOLD,
            max_entries: None,
        }
    }
}

/// `<temp dir>/hybridkv`
pub fn default_base_dir() -> PathBuf {
    std::env::temp_dir().join("hybridkv")
}

impl CacheConfig {
    /// Ephemeral configuration: in-memory metadata, blobs under `blob_root`
    pub fn ephemeral(blob_root: impl Into<PathBuf>) -> Self {
        Self {
            blob_root: blob_root.into(),
            metadata: MetadataLocation::InMemory,
            ..Self::default()
        }
    }

    /// Persistent configuration rooted in one directory
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            blob_root: dir.join("blobs"),
            metadata: MetadataLocation::File(dir.join("metadata.sqlite3")),
            ..Self::default()
        }
    }

    /// Check the configuration before any path is touched
    pub fn validate(&self) -> Result<()> {
        if self.blob_root.as_os_str().is_empty() {
            return Err(CacheError::Configuration {
                message: "Blob root path is empty".to_string(),
                recovery_hint: RecoveryHint::UpdateConfiguration,
            });
        }

        if self.blob_root.exists() && !self.blob_root.is_dir() {
            return Err(CacheError::Configuration {
                message: format!(
                    "Blob root '{}' exists but is not a directory",
                    self.blob_root.display()
                ),
                recovery_hint: RecoveryHint::UpdateConfiguration,
            });
        }

        if let MetadataLocation::File(path) = &self.metadata {
            if path.is_dir() {
                return Err(CacheError::Configuration {
                    message: format!("Metadata path '{}' is a directory", path.display()),
                    recovery_hint: RecoveryHint::UpdateConfiguration,
                });
            }
        }

        Ok(())
    }

    pub fn eviction_enabled(&self) -> bool {
        self.max_entries.is_some()
    }
}

/// Builder for cache configurations
#[derive(Debug, Clone, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn from_config(config: CacheConfig) -> Self {
        Self { config }
    }

    pub fn with_blob_root(mut self, blob_root: impl Into<PathBuf>) -> Self {
        self.config.blob_root = blob_root.into();
        self
    }

    pub fn with_metadata(mut self, metadata: impl Into<MetadataLocation>) -> Self {
        self.config.metadata = metadata.into();
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.config.default_ttl = ttl;
        self
    }

    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.config.grace_period = grace;
        self
    }

    pub fn with_inline_threshold(mut self, threshold: usize) -> Self {
        self.config.inline_threshold = threshold;
        self
    }

    /// Bound the number of unexpired entries; zero removes the bound
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.config.max_entries = NonZeroUsize::new(max_entries);
        self
    }

    pub fn build(self) -> CacheConfig {
        self.config
    }
}

impl From<PathBuf> for MetadataLocation {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

/// Optional settings read from a config file or the environment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialConfig {
    pub blob_root: Option<PathBuf>,
    pub metadata: Option<String>,
    pub ttl_seconds: Option<u64>,
    pub grace_seconds: Option<u64>,
    pub inline_threshold: Option<usize>,
    pub max_entries: Option<usize>,
}

impl PartialConfig {
    fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Overlay the set fields onto `config`
    pub fn apply(&self, mut config: CacheConfig) -> CacheConfig {
        if let Some(blob_root) = &self.blob_root {
            config.blob_root = blob_root.clone();
        }
        if let Some(metadata) = &self.metadata {
            config.metadata = MetadataLocation::from(metadata.as_str());
        }
        if let Some(ttl) = self.ttl_seconds {
            config.default_ttl = Duration::from_secs(ttl);
        }
        if let Some(grace) = self.grace_seconds {
            config.grace_period = Duration::from_secs(grace);
        }
        if let Some(threshold) = self.inline_threshold {
            config.inline_threshold = threshold;
        }
        if let Some(max_entries) = self.max_entries {
            config.max_entries = NonZeroUsize::new(max_entries);
        }
        config
    }
}

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "HYBRIDKV_";

/// Source a configuration value came from, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Default,
    ConfigFile(PathBuf),
    EnvironmentVariable(String),
}

/// Loads configuration with full precedence handling
pub struct CacheConfigLoader;

impl CacheConfigLoader {
    /// Defaults, then the user config file, then `HYBRIDKV_*` variables
    pub fn load() -> Result<(CacheConfig, Vec<ConfigSource>)> {
        let mut config = CacheConfig::default();
        let mut sources = vec![ConfigSource::Default];

        if let Some(path) = Self::config_file_path() {
            if let Some(file_config) = Self::read_file(&path)? {
                config = file_config.apply(config);
                sources.push(ConfigSource::ConfigFile(path));
            }
        }

        let env_config = Self::from_env()?;
        if !env_config.is_empty() {
            config = env_config.apply(config);
            sources.push(ConfigSource::EnvironmentVariable(format!("{ENV_PREFIX}*")));
        }

        Ok((config, sources))
    }

    /// Defaults overlaid with one explicit config file
    pub fn load_from_file(path: &Path) -> Result<CacheConfig> {
        match Self::read_file(path)? {
            Some(file_config) => Ok(file_config.apply(CacheConfig::default())),
            None => Err(CacheError::Configuration {
                message: format!("Config file '{}' does not exist", path.display()),
                recovery_hint: RecoveryHint::UpdateConfiguration,
            }),
        }
    }

    /// `$XDG_CONFIG_HOME/hybridkv/config.json`, falling back to the platform config dir
    pub fn config_file_path() -> Option<PathBuf> {
        let config_dir = match std::env::var_os("XDG_CONFIG_HOME") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir()?,
        };
        Some(config_dir.join("hybridkv").join("config.json"))
    }

    fn read_file(path: &Path) -> Result<Option<PartialConfig>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CacheError::Io {
                    path: path.to_path_buf(),
                    operation: "read config file",
                    source: e,
                    recovery_hint: RecoveryHint::CheckPermissions {
                        path: path.to_path_buf(),
                    },
                });
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| CacheError::Serialization {
                path: path.to_path_buf(),
                source: e,
                recovery_hint: RecoveryHint::Manual {
                    instructions: "Check config file syntax".to_string(),
                },
            })
    }

    /// Read `HYBRIDKV_*` variables
    pub fn from_env() -> Result<PartialConfig> {
        Ok(PartialConfig {
            blob_root: std::env::var_os(format!("{ENV_PREFIX}BLOB_ROOT")).map(PathBuf::from),
            metadata: std::env::var(format!("{ENV_PREFIX}METADATA")).ok(),
            ttl_seconds: parse_env("TTL_SECONDS")?,
            grace_seconds: parse_env("GRACE_SECONDS")?,
            inline_threshold: parse_env("INLINE_THRESHOLD")?,
            max_entries: parse_env("MAX_ENTRIES")?,
        })
    }
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: fmt::Display,
{
    let var = format!("{ENV_PREFIX}{name}");
    match std::env::var(&var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| CacheError::Configuration {
                message: format!("Invalid value '{raw}' for {var}: {e}"),
                recovery_hint: RecoveryHint::UpdateConfiguration,
            }),
        Err(_) => Ok(None),
    }
}
