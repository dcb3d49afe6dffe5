//! Data models for weather record uploads
//!
//! This module contains the core data structures passed between the host
//! station software, the upload queue and the request formatter: archive
//! records, observation values, unit systems and the API credential.

use crate::constants::{CREDENTIAL_MASK_CHAR, CREDENTIAL_VISIBLE_CHARS};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Unit System Enumeration
// =============================================================================

/// Unit system a record's values are expressed in
///
/// The numeric codes match the `usUnits` values written by weewx-style
/// station software, so records can be decoded straight from their archive
/// representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "UnitSystemRepr", into = "u8")]
#[repr(u8)]
pub enum UnitSystem {
    /// Fahrenheit, inHg, mph, inches
    Us = 0x01,
    /// Celsius, mbar, km/h, cm
    Metric = 0x10,
    /// Celsius, mbar, m/s, mm
    MetricWx = 0x11,
}

impl UnitSystem {
    /// All supported unit systems
    pub const ALL: [UnitSystem; 3] = [UnitSystem::Us, UnitSystem::Metric, UnitSystem::MetricWx];

    /// Numeric code as carried in `usUnits`
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Canonical configuration name
    pub fn name(self) -> &'static str {
        match self {
            UnitSystem::Us => "US",
            UnitSystem::Metric => "METRIC",
            UnitSystem::MetricWx => "METRICWX",
        }
    }

    /// Look up a unit system by its numeric code
    pub fn from_code(code: u64) -> Result<Self> {
        match code {
            0x01 => Ok(UnitSystem::Us),
            0x10 => Ok(UnitSystem::Metric),
            0x11 => Ok(UnitSystem::MetricWx),
            other => Err(Error::configuration(format!(
                "Unknown unit system code {other:#04x}"
            ))),
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UnitSystem {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "US" => Ok(UnitSystem::Us),
            "METRIC" => Ok(UnitSystem::Metric),
            "METRICWX" => Ok(UnitSystem::MetricWx),
            _ => match trimmed.parse::<u64>() {
                Ok(code) => Self::from_code(code),
                Err(_) => Err(Error::configuration(format!(
                    "Unknown unit system '{trimmed}': must be one of US, METRIC, METRICWX"
                ))),
            },
        }
    }
}

/// Wire representation accepted for a unit system: code or name
#[derive(Deserialize)]
#[serde(untagged)]
enum UnitSystemRepr {
    Code(u64),
    Name(String),
}

impl TryFrom<UnitSystemRepr> for UnitSystem {
    type Error = Error;

    fn try_from(repr: UnitSystemRepr) -> Result<Self> {
        match repr {
            UnitSystemRepr::Code(code) => UnitSystem::from_code(code),
            UnitSystemRepr::Name(name) => name.parse(),
        }
    }
}

impl From<UnitSystem> for u8 {
    fn from(system: UnitSystem) -> Self {
        system.code()
    }
}

// =============================================================================
// Observation Value
// =============================================================================

/// A single observation value as delivered by the host
///
/// Values are usually numeric, but archive rows can carry nulls and the odd
/// textual value. Anything that does not coerce to a float is dropped by the
/// formatter rather than treated as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObsValue {
    /// Numeric reading
    Number(f64),
    /// Textual reading, numeric if it parses
    Text(String),
    /// Explicit missing value
    Null,
}

impl ObsValue {
    /// Coerce to a float, `None` for nulls and non-numeric text
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ObsValue::Number(v) => Some(*v),
            ObsValue::Text(s) => s.trim().parse::<f64>().ok(),
            ObsValue::Null => None,
        }
    }

    /// Whether this is an explicit null
    pub fn is_null(&self) -> bool {
        matches!(self, ObsValue::Null)
    }
}

impl From<f64> for ObsValue {
    fn from(value: f64) -> Self {
        ObsValue::Number(value)
    }
}

impl From<i64> for ObsValue {
    fn from(value: i64) -> Self {
        ObsValue::Number(value as f64)
    }
}

impl From<&str> for ObsValue {
    fn from(value: &str) -> Self {
        ObsValue::Text(value.to_string())
    }
}

impl From<String> for ObsValue {
    fn from(value: String) -> Self {
        ObsValue::Text(value)
    }
}

impl<T: Into<ObsValue>> From<Option<T>> for ObsValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ObsValue::Null, Into::into)
    }
}

// =============================================================================
// Archive Record
// =============================================================================

/// One timestamped set of observation values to publish
///
/// Serialises to the flat archive shape used by the host:
/// `{"dateTime": 1700000000, "usUnits": 1, "outTemp": 32.5, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Epoch seconds at the end of the archive interval
    #[serde(rename = "dateTime")]
    pub date_time: i64,

    /// Unit system of every value in this record
    #[serde(rename = "usUnits")]
    pub us_units: UnitSystem,

    /// Observation values keyed by observation name
    #[serde(flatten)]
    pub values: BTreeMap<String, ObsValue>,
}

impl Record {
    /// Create an empty record
    pub fn new(date_time: i64, us_units: UnitSystem) -> Self {
        Self {
            date_time,
            us_units,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style insertion of an observation value
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<ObsValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace an observation value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ObsValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Raw observation value
    pub fn get(&self, name: &str) -> Option<&ObsValue> {
        self.values.get(name)
    }

    /// Observation value coerced to a float
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(ObsValue::as_f64)
    }

    /// Whether the observation is present with a non-null value
    pub fn has_value(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(|v| !v.is_null())
    }

    /// Copy in every value from `other` that is absent or null here
    ///
    /// Returns the number of values filled in.
    pub fn merge_missing(&mut self, other: &Record) -> usize {
        let mut filled = 0;
        for (name, value) in &other.values {
            if value.is_null() || self.has_value(name) {
                continue;
            }
            self.values.insert(name.clone(), value.clone());
            filled += 1;
        }
        filled
    }

    /// Decode a record from its JSON archive representation
    pub fn from_json(line: &str) -> Result<Self> {
        serde_json::from_str(line).map_err(|e| {
            Error::record_decoding(format!("Invalid record '{}'", line.trim()), Some(e))
        })
    }
}

// =============================================================================
// Upload Queue Element
// =============================================================================

/// Element of the upload queue
#[derive(Debug, Clone, PartialEq)]
pub enum UploadTask {
    /// A record to publish
    Record(Record),
    /// Terminal sentinel: stop after draining what came before it
    Shutdown,
}

// =============================================================================
// API Credential
// =============================================================================

/// Channel write API key
///
/// `Debug` and `Display` only ever show the masked form, so the key can be
/// logged or included in errors without leaking it.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key, rejecting empty or blank values
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            return Err(Error::configuration(
                "Data will not be uploaded: missing option api_key",
            ));
        }
        Ok(Self(key))
    }

    /// The raw key, for the request header only
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// The key with all but its last four characters masked
    pub fn masked(&self) -> String {
        mask_credential(&self.0)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({})", self.masked())
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

/// Replace all but the last four characters of a credential with `X`
///
/// Credentials of four characters or fewer are masked entirely.
pub fn mask_credential(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= CREDENTIAL_VISIBLE_CHARS {
        return CREDENTIAL_MASK_CHAR.to_string().repeat(chars.len());
    }
    let hidden = chars.len() - CREDENTIAL_VISIBLE_CHARS;
    let mut masked = CREDENTIAL_MASK_CHAR.to_string().repeat(hidden);
    masked.extend(&chars[hidden..]);
    masked
}
