//! ThingSpeak Uplink Library
//!
//! A Rust library for republishing locally recorded weather station archive
//! records to a ThingSpeak channel over HTTP.
//!
//! This library provides tools for:
//! - Mapping weather observations onto the eight numeric ThingSpeak channel fields
//! - Converting observation values between US, METRIC and METRICWX unit systems
//! - Formatting ThingSpeak update requests with printf-style value formats
//! - Running a background upload worker with pacing, staleness and backlog limits
//! - Bounded, constant-wait retry of failed uploads
//! - Augmenting records with rain totals from an in-memory archive

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod field_mapping;
        pub mod request_formatter;
        pub mod units;
        pub mod upload_worker;
    }
    pub mod adapters {
        pub mod archive;
        pub mod http;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{ObsValue, Record, UnitSystem, UploadTask};
pub use config::WorkerConfig;

/// Result type alias for the ThingSpeak uplink
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for upload operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error (fatal to worker construction)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Configuration file could not be parsed
    #[error("Configuration file error in '{file}': {message}")]
    ConfigFile {
        file: String,
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Record could not be decoded
    #[error("Record decoding error: {message}")]
    RecordDecoding {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Transport-level failure (connection refused, DNS, TLS, body read)
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Attempt exceeded its timeout
    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Endpoint answered with a non-success HTTP status
    #[error("Endpoint returned HTTP status {status}")]
    HttpStatus { status: u16 },

    /// Endpoint answered 2xx but signalled failure in the body
    #[error("Upload rejected by endpoint: {message}")]
    LogicalFailure { message: String },

    /// Every attempt for a record failed
    #[error("Failed upload after {tries} tries")]
    RetriesExhausted { tries: u32 },

    /// Unit conversion not possible
    #[error("Unit conversion error: cannot convert '{from}' to '{to}'")]
    UnitConversion { from: String, to: String },

    /// Supplemental record source unavailable
    #[error("Augmentation error: {message}")]
    Augmentation { message: String },

    /// Worker has stopped and no longer accepts records
    #[error("Upload queue is closed")]
    QueueClosed,

    /// Worker task panicked or was cancelled
    #[error("Upload worker task failed: {message}")]
    WorkerTask { message: String },

    /// Invalid printf-style format string
    #[error("Invalid format string '{format}': {message}")]
    InvalidFormat { format: String, message: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a configuration file error
    pub fn config_file(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<toml::de::Error>,
    ) -> Self {
        Self::ConfigFile {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a record decoding error
    pub fn record_decoding(message: impl Into<String>, source: Option<serde_json::Error>) -> Self {
        Self::RecordDecoding {
            message: message.into(),
            source,
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(seconds: u64) -> Self {
        Self::Timeout { seconds }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16) -> Self {
        Self::HttpStatus { status }
    }

    /// Create a logical failure error
    pub fn logical_failure(message: impl Into<String>) -> Self {
        Self::LogicalFailure {
            message: message.into(),
        }
    }

    /// Create a retries exhausted error
    pub fn retries_exhausted(tries: u32) -> Self {
        Self::RetriesExhausted { tries }
    }

    /// Create a unit conversion error
    pub fn unit_conversion(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::UnitConversion {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create an augmentation error
    pub fn augmentation(message: impl Into<String>) -> Self {
        Self::Augmentation {
            message: message.into(),
        }
    }

    /// Create a worker task error
    pub fn worker_task(message: impl Into<String>) -> Self {
        Self::WorkerTask {
            message: message.into(),
        }
    }

    /// Create an invalid format error
    pub fn invalid_format(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            format: format.into(),
            message: message.into(),
        }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::RecordDecoding {
            message: "JSON decoding failed".to_string(),
            source: Some(error),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            Self::HttpStatus {
                status: status.as_u16(),
            }
        } else {
            Self::Transport {
                message: error.to_string(),
            }
        }
    }
}
