//! Configuration management and validation.
//!
//! Two layers live here:
//!
//! - [`UplinkConfig`] mirrors the configuration file. Durations are plain
//!   seconds and every option has a default. It is layered as
//!   file → environment → command line, then validated.
//! - [`WorkerConfig`] is what the upload worker runs with: typed durations,
//!   a checked API key, built once and never mutated.
//!
//! # Example file
//!
//! ```toml
//! api_key = "ABCDEFGH1234"
//! unit_system = "METRICWX"
//! post_interval = 300
//! max_backlog = 10
//! append_units_label = true
//!
//! [fields.field1]
//! obs = "outTemp"
//! format = "%.1f"
//! ```

use crate::app::models::{ApiKey, UnitSystem};
use crate::app::services::field_mapping::{FieldMap, FieldMappingConfig, resolve_field_map};
use crate::app::services::units::UnitConverter;
use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_MAX_TRIES, DEFAULT_PROTOCOL_NAME,
    DEFAULT_RETRY_WAIT_SECS, DEFAULT_SERVER_URL, DEFAULT_TIMEOUT_SECS, ENV_API_KEY,
    ENV_SERVER_URL, ENV_UNIT_SYSTEM,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

// =============================================================================
// Worker Configuration
// =============================================================================

/// Settings of one upload worker
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    /// Channel write key
    pub api_key: ApiKey,

    /// Update endpoint
    pub server_url: String,

    /// Normalise records to this unit system before formatting
    pub unit_system: Option<UnitSystem>,

    /// Merge values from the supplemental source, when one is attached
    pub augment_record: bool,

    /// Minimum spacing between posted record timestamps
    pub post_interval: Option<Duration>,

    /// Records older than this (against the wall clock) are skipped
    pub stale: Option<Duration>,

    /// Most records kept per drain; older excess is discarded
    pub max_backlog: Option<usize>,

    /// Log successful posts
    pub log_success: bool,

    /// Log posts that failed after every retry
    pub log_failure: bool,

    /// Bound on a single attempt
    pub timeout: Duration,

    /// Attempts per record, including the first
    pub max_tries: u32,

    /// Wait between attempts
    pub retry_wait: Duration,

    /// Format records but never send them
    pub skip_upload: bool,

    /// Name used in log messages
    pub protocol_name: String,
}

impl WorkerConfig {
    /// Configuration with default settings for the given key
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            server_url: DEFAULT_SERVER_URL.to_string(),
            unit_system: None,
            augment_record: true,
            post_interval: None,
            stale: None,
            max_backlog: None,
            log_success: true,
            log_failure: true,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_tries: DEFAULT_MAX_TRIES,
            retry_wait: Duration::from_secs(DEFAULT_RETRY_WAIT_SECS),
            skip_upload: false,
            protocol_name: DEFAULT_PROTOCOL_NAME.to_string(),
        }
    }

    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into();
        self
    }

    pub fn with_unit_system(mut self, unit_system: UnitSystem) -> Self {
        self.unit_system = Some(unit_system);
        self
    }

    pub fn without_augmentation(mut self) -> Self {
        self.augment_record = false;
        self
    }

    pub fn with_post_interval(mut self, interval: Duration) -> Self {
        self.post_interval = Some(interval);
        self
    }

    pub fn with_stale(mut self, stale: Duration) -> Self {
        self.stale = Some(stale);
        self
    }

    pub fn with_max_backlog(mut self, max_backlog: usize) -> Self {
        self.max_backlog = Some(max_backlog);
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, max_tries: u32, retry_wait: Duration) -> Self {
        self.max_tries = max_tries;
        self.retry_wait = retry_wait;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_skip_upload(mut self) -> Self {
        self.skip_upload = true;
        self
    }

    /// Control which outcomes are logged
    pub fn with_logging(mut self, log_success: bool, log_failure: bool) -> Self {
        self.log_success = log_success;
        self.log_failure = log_failure;
        self
    }

    /// Check the settings the worker cannot run without
    pub fn validate(&self) -> Result<()> {
        if self.max_tries == 0 {
            return Err(Error::configuration("max_tries must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(Error::configuration("timeout must be greater than zero"));
        }
        url::Url::parse(&self.server_url).map_err(|e| {
            Error::configuration(format!("Invalid server_url '{}': {e}", self.server_url))
        })?;
        Ok(())
    }
}

// =============================================================================
// File Configuration
// =============================================================================

/// Uploader configuration as read from file, environment and command line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UplinkConfig {
    /// Channel write key (required before a worker can be built)
    pub api_key: Option<String>,

    /// Update endpoint
    pub server_url: String,

    /// Target unit system, by name or code
    pub unit_system: Option<UnitSystem>,

    /// Merge supplemental rain totals into records
    pub augment_record: bool,

    /// Seconds between posted record timestamps
    pub post_interval: Option<u64>,

    /// Seconds after which a record is too old to post
    pub stale: Option<u64>,

    /// Most records kept per drain
    pub max_backlog: Option<usize>,

    pub log_success: bool,
    pub log_failure: bool,

    /// Seconds per attempt
    pub timeout: u64,

    /// Attempts per record
    pub max_tries: u32,

    /// Seconds between attempts
    pub retry_wait: u64,

    /// Format records without sending them
    pub skip_upload: bool,

    /// Channel field layout
    #[serde(flatten)]
    pub mapping: FieldMappingConfig,
}

impl Default for UplinkConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            server_url: DEFAULT_SERVER_URL.to_string(),
            unit_system: None,
            augment_record: true,
            post_interval: None,
            stale: None,
            max_backlog: None,
            log_success: true,
            log_failure: true,
            timeout: DEFAULT_TIMEOUT_SECS,
            max_tries: DEFAULT_MAX_TRIES,
            retry_wait: DEFAULT_RETRY_WAIT_SECS,
            skip_upload: false,
            mapping: FieldMappingConfig::default(),
        }
    }
}

impl UplinkConfig {
    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::io(format!("Failed to read config file {}", path.display()), e)
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            Error::ConfigFile {
                message, source, ..
            } => Error::config_file(path.display().to_string(), message, source),
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::config_file("<inline>", e.message().to_string(), Some(e)))
    }

    /// Load the file layer
    ///
    /// # Arguments
    ///
    /// * `path` - Explicit config file; must exist when given
    ///
    /// # Returns
    ///
    /// The parsed file, the default-location file when it exists, or the
    /// built-in defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            debug!("Loading configuration from {}", path.display());
            return Self::from_file(path);
        }

        match default_config_path() {
            Some(path) if path.is_file() => {
                debug!("Loading configuration from {}", path.display());
                Self::from_file(&path)
            }
            _ => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Apply the process environment on top of this configuration
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply environment overrides read through `lookup`
    ///
    /// Blank variables are ignored.
    pub fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = read(ENV_API_KEY) {
            debug!("API key taken from {}", ENV_API_KEY);
            self.api_key = Some(key);
        }
        if let Some(url) = read(ENV_SERVER_URL) {
            self.server_url = url;
        }
        if let Some(system) = read(ENV_UNIT_SYSTEM) {
            self.unit_system = Some(system.parse()?);
        }
        Ok(self)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into();
        self
    }

    pub fn with_unit_system(mut self, unit_system: UnitSystem) -> Self {
        self.unit_system = Some(unit_system);
        self
    }

    pub fn with_skip_upload(mut self) -> Self {
        self.skip_upload = true;
        self
    }

    /// Build and validate the worker settings
    pub fn worker_config(&self) -> Result<WorkerConfig> {
        let api_key = ApiKey::new(self.api_key.clone().unwrap_or_default())?;

        let config = WorkerConfig {
            api_key,
            server_url: self.server_url.clone(),
            unit_system: self.unit_system,
            augment_record: self.augment_record,
            post_interval: self.post_interval.map(Duration::from_secs),
            stale: self.stale.map(Duration::from_secs),
            max_backlog: self.max_backlog,
            log_success: self.log_success,
            log_failure: self.log_failure,
            timeout: Duration::from_secs(self.timeout),
            max_tries: self.max_tries,
            retry_wait: Duration::from_secs(self.retry_wait),
            skip_upload: self.skip_upload,
            protocol_name: DEFAULT_PROTOCOL_NAME.to_string(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Resolve the channel field layout
    pub fn field_map(&self, converter: &dyn UnitConverter) -> Result<FieldMap> {
        resolve_field_map(&self.mapping, self.unit_system, converter)
    }
}

/// Default configuration file location, e.g. `~/.config/thingspeak-uplink/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
