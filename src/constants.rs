//! Application constants for the ThingSpeak uplink
//!
//! This module contains all configuration constants, default values,
//! and mappings used throughout the uplink.

// =============================================================================
// Endpoint and Protocol
// =============================================================================

/// Canonical ThingSpeak channel update endpoint
pub const DEFAULT_SERVER_URL: &str = "http://api.thingspeak.com/update";

/// Protocol name used in log messages
pub const DEFAULT_PROTOCOL_NAME: &str = "ThingSpeak";

/// Header carrying the channel write API key
pub const API_KEY_HEADER: &str = "THINGSPEAKAPIKEY";

/// Client identification sent with every request
pub const USER_AGENT: &str = concat!("thingspeak-uplink/", env!("CARGO_PKG_VERSION"));

/// Response body ThingSpeak returns when an update was not accepted
pub const FAILED_POST_BODY: &str = "0";

/// Query parameter carrying the record timestamp
pub const DATETIME_FIELD: &str = "datetime";

/// Timestamp layout expected by the update endpoint (always UTC)
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Channel field keys accepted by the update endpoint
pub const CHANNEL_FIELDS: &[&str] = &[
    "field1", "field2", "field3", "field4", "field5", "field6", "field7", "field8",
];

// =============================================================================
// Worker Defaults
// =============================================================================

/// Default per-attempt timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default number of attempts per record
pub const DEFAULT_MAX_TRIES: u32 = 3;

/// Default wait between attempts in seconds
pub const DEFAULT_RETRY_WAIT_SECS: u64 = 5;

/// Default printf-style format when a field does not specify one
pub const DEFAULT_FIELD_FORMAT: &str = "%s";

/// Number of trailing credential characters left visible in logs
pub const CREDENTIAL_VISIBLE_CHARS: usize = 4;

/// Character used to mask the hidden part of a credential
pub const CREDENTIAL_MASK_CHAR: char = 'X';

// =============================================================================
// Default Field Mapping
// =============================================================================

/// Default channel layout: (field key, observation, format)
pub const DEFAULT_FIELDS: &[(&str, &str, &str)] = &[
    ("field1", "outTemp", "%.1f"),
    ("field2", "outHumidity", "%.0f"),
    ("field3", "windSpeed", "%.1f"),
    ("field4", "windDir", "%03.0f"),
    ("field5", "windGust", "%.1f"),
    ("field6", "barometer", "%.3f"),
    ("field7", "rain", "%.2f"),
];

// =============================================================================
// Unit Label Reductions
// =============================================================================

/// Short tokens for verbose unit names, used when labelling fields.
///
/// A `None` token means the unit is not worth a suffix at all.
pub const UNIT_REDUCTIONS: &[(&str, Option<&str>)] = &[
    ("degree_F", Some("F")),
    ("degree_C", Some("C")),
    ("inch", Some("in")),
    ("mile_per_hour", Some("mph")),
    ("mile_per_hour2", Some("mph")),
    ("km_per_hour", Some("kph")),
    ("km_per_hour2", Some("kph")),
    ("meter_per_second", Some("mps")),
    ("meter_per_second2", Some("mps")),
    ("degree_compass", None),
    ("watt_per_meter_squared", Some("Wpm2")),
    ("uv_index", None),
    ("percent", None),
    ("unix_epoch", None),
];

// =============================================================================
// Configuration
// =============================================================================

/// Directory name under the platform config dir
pub const CONFIG_DIR_NAME: &str = "thingspeak-uplink";

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable overriding the API key
pub const ENV_API_KEY: &str = "THINGSPEAK_API_KEY";

/// Environment variable overriding the endpoint
pub const ENV_SERVER_URL: &str = "THINGSPEAK_SERVER_URL";

/// Environment variable overriding the target unit system
pub const ENV_UNIT_SYSTEM: &str = "THINGSPEAK_UNIT_SYSTEM";

// =============================================================================
// Rain Archive
// =============================================================================

/// Longest window the rain archive has to answer for (rain24)
pub const RAIN_ARCHIVE_RETENTION_SECS: i64 = 24 * 3600;

/// Window for hourRain
pub const HOUR_SECS: i64 = 3600;

/// Length of a UTC day, for dayRain
pub const DAY_SECS: i64 = 24 * 3600;
