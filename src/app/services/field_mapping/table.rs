//! Resolved channel field table

use crate::app::services::units::Unit;
use crate::constants::{CHANNEL_FIELDS, DATETIME_FIELD, DEFAULT_FIELDS};
use crate::{Error, Result};
use std::collections::BTreeMap;

use super::printf::NumberFormat;

/// How one channel field is filled from a record
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Observation to read from the record
    pub obs: String,
    /// printf-style format applied to the value
    pub format: NumberFormat,
    /// Unit to convert into before formatting, if any
    pub units: Option<Unit>,
    /// Human-readable label (e.g. `outTemp_F`)
    pub label: Option<String>,
}

impl FieldSpec {
    /// Create a field spec, validating the format string
    pub fn new(obs: impl Into<String>, format: &str) -> Result<Self> {
        let obs = obs.into();
        if obs.trim().is_empty() {
            return Err(Error::configuration("Field observation name cannot be empty"));
        }
        Ok(Self {
            obs,
            format: NumberFormat::parse(format)?,
            units: None,
            label: None,
        })
    }

    /// Convert to the given unit before formatting
    pub fn with_units(mut self, units: Unit) -> Self {
        self.units = Some(units);
        self
    }

    /// Attach a human-readable label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Channel field key → field spec, restricted to `field1`..`field8`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldMap {
    fields: BTreeMap<String, FieldSpec>,
}

impl FieldMap {
    /// Build a table, rejecting keys the update endpoint does not accept
    pub fn new(entries: impl IntoIterator<Item = (String, FieldSpec)>) -> Result<Self> {
        let mut fields = BTreeMap::new();
        for (key, spec) in entries {
            validate_field_key(&key)?;
            fields.insert(key, spec);
        }
        Ok(Self { fields })
    }

    /// The standard seven-field weather layout
    pub fn default_layout() -> Self {
        let fields = DEFAULT_FIELDS
            .iter()
            .map(|(key, obs, format)| {
                let spec = FieldSpec {
                    obs: (*obs).to_string(),
                    format: NumberFormat::parse(format)
                        .unwrap_or_else(|e| unreachable!("built-in format: {e}")),
                    units: None,
                    label: None,
                };
                ((*key).to_string(), spec)
            })
            .collect();
        Self { fields }
    }

    /// Field spec for a channel key
    pub fn get(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.get(key)
    }

    /// Fields in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Check that a key names one of the eight channel fields
pub fn validate_field_key(key: &str) -> Result<()> {
    if key == DATETIME_FIELD {
        return Err(Error::configuration(format!(
            "'{DATETIME_FIELD}' is reserved for the record timestamp and cannot be mapped"
        )));
    }
    if !CHANNEL_FIELDS.contains(&key) {
        return Err(Error::configuration(format!(
            "Unknown channel field '{key}': expected one of {}",
            CHANNEL_FIELDS.join(", ")
        )));
    }
    Ok(())
}
