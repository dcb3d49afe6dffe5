//! Field mapping configuration and its resolution into a [`FieldMap`]
//!
//! Resolution is pure and happens once, before the worker starts. The worker
//! only ever sees the resolved table.

use crate::app::models::UnitSystem;
use crate::app::services::units::{Unit, UnitConverter};
use crate::constants::{DEFAULT_FIELD_FORMAT, DEFAULT_FIELDS};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::printf::NumberFormat;
use super::table::{FieldMap, FieldSpec, validate_field_key};

/// Per-field configuration as written in the config file
///
/// ```toml
/// [fields.field2]
/// obs = "outTemp"
/// units = "degree_C"
/// format = "%.2f"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldOverride {
    /// Observation to read; inherited from the default layout when omitted
    pub obs: Option<String>,
    /// Explicit label, wins over any derived label
    pub name: Option<String>,
    /// printf-style format; inherited from the default layout, else `%s`
    pub format: Option<String>,
    /// Target unit name, e.g. `degree_C`
    pub units: Option<String>,
}

/// Field mapping section of the uploader configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldMappingConfig {
    /// Replacement channel layout; `None` keeps the default layout
    #[serde(default)]
    pub fields: Option<BTreeMap<String, FieldOverride>>,

    /// Derive `<obs>_<unit>` labels for fields without an explicit name
    #[serde(default)]
    pub append_units_label: bool,
}

impl FieldMappingConfig {
    /// Replace the whole channel layout
    pub fn with_fields(mut self, fields: BTreeMap<String, FieldOverride>) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Enable unit-suffixed labels
    pub fn with_units_label(mut self) -> Self {
        self.append_units_label = true;
        self
    }
}

/// Resolve the configured layout into the table the formatter uses
///
/// # Arguments
///
/// * `config` - Field mapping configuration
/// * `unit_system` - Target unit system of the worker, used for label suffixes (US when unset)
/// * `converter` - Unit adapter used to look up native units and groups
///
/// # Returns
///
/// The resolved `FieldMap`, or a configuration error for unknown keys,
/// units, formats or unit/observation mismatches
pub fn resolve_field_map(
    config: &FieldMappingConfig,
    unit_system: Option<UnitSystem>,
    converter: &dyn UnitConverter,
) -> Result<FieldMap> {
    let label_system = unit_system.unwrap_or(UnitSystem::Us);

    let overrides: BTreeMap<String, FieldOverride> = match &config.fields {
        Some(fields) => fields.clone(),
        None => DEFAULT_FIELDS
            .iter()
            .map(|(key, _, _)| ((*key).to_string(), FieldOverride::default()))
            .collect(),
    };

    let mut entries = Vec::with_capacity(overrides.len());
    for (key, field) in overrides {
        validate_field_key(&key)?;
        let spec = resolve_field(&key, &field, config.append_units_label, label_system, converter)?;
        debug!(
            "Channel {} <- {} ({}{})",
            key,
            spec.obs,
            spec.format,
            spec.units.map(|u| format!(", {u}")).unwrap_or_default()
        );
        entries.push((key, spec));
    }

    FieldMap::new(entries)
}

fn resolve_field(
    key: &str,
    field: &FieldOverride,
    append_units_label: bool,
    label_system: UnitSystem,
    converter: &dyn UnitConverter,
) -> Result<FieldSpec> {
    let default = DEFAULT_FIELDS.iter().find(|(k, _, _)| *k == key);

    let obs = match (&field.obs, default) {
        (Some(obs), _) => obs.trim().to_string(),
        (None, Some((_, obs, _))) => (*obs).to_string(),
        (None, None) => {
            return Err(Error::configuration(format!(
                "Channel field '{key}' has no observation (set 'obs')"
            )));
        }
    };
    if obs.is_empty() {
        return Err(Error::configuration(format!(
            "Channel field '{key}' has an empty observation name"
        )));
    }

    let format = match (&field.format, default) {
        (Some(format), _) => format.as_str(),
        (None, Some((_, default_obs, format))) if *default_obs == obs => *format,
        _ => DEFAULT_FIELD_FORMAT,
    };
    let format = NumberFormat::parse(format)
        .map_err(|e| Error::configuration(format!("Channel field '{key}': {e}")))?;

    let units = field
        .units
        .as_deref()
        .map(|name| {
            name.parse::<Unit>()
                .map_err(|e| Error::configuration(format!("Channel field '{key}': {e}")))
        })
        .transpose()?;

    if let (Some(unit), Some(group)) = (units, converter.group_of(&obs)) {
        if unit.group() != group {
            return Err(Error::configuration(format!(
                "Channel field '{key}': unit '{unit}' does not apply to observation '{obs}'"
            )));
        }
    }

    let label = match &field.name {
        Some(name) => Some(name.clone()),
        None if append_units_label => {
            let unit = units.or_else(|| converter.native_unit(&obs, label_system));
            units_label(&obs, unit)
        }
        None => None,
    };

    Ok(FieldSpec {
        obs,
        format,
        units,
        label,
    })
}

/// `<obs>_<suffix>` label, `None` when the unit takes no suffix or is unknown
pub fn units_label(obs: &str, unit: Option<Unit>) -> Option<String> {
    unit.and_then(Unit::label_suffix)
        .map(|suffix| format!("{obs}_{suffix}"))
}
