//! Unit conversion adapter and its standard implementation

use crate::app::models::{ObsValue, Record, UnitSystem};
use crate::{Error, Result};
use tracing::debug;

use super::observations::observation_group;
use super::unit::{Unit, UnitGroup};

/// Converts observation values between units and unit systems
///
/// The worker and the request formatter only talk to this trait, so a host
/// with its own unit tables can plug them in.
pub trait UnitConverter: Send + Sync {
    /// Unit group of a named observation
    fn group_of(&self, obs: &str) -> Option<UnitGroup>;

    /// Convert a scalar between two units of the same group
    fn convert(&self, value: f64, from: Unit, to: Unit) -> Result<f64>;

    /// Native unit of a named observation under a unit system
    fn native_unit(&self, obs: &str, system: UnitSystem) -> Option<Unit> {
        self.group_of(obs).map(|group| group.unit_in(system))
    }

    /// Express every convertible value of a record in another unit system
    ///
    /// Values of unknown observations and non-numeric values are passed
    /// through untouched. A value whose conversion fails is dropped so the
    /// record never mixes unit systems.
    fn to_system(&self, record: &Record, system: UnitSystem) -> Record {
        if record.us_units == system {
            return record.clone();
        }

        let mut converted = Record::new(record.date_time, system);
        for (name, value) in &record.values {
            let (Some(group), Some(v)) = (self.group_of(name), value.as_f64()) else {
                converted.values.insert(name.clone(), value.clone());
                continue;
            };
            let from = group.unit_in(record.us_units);
            let to = group.unit_in(system);
            match self.convert(v, from, to) {
                Ok(out) => {
                    converted.values.insert(name.clone(), ObsValue::Number(out));
                }
                Err(e) => debug!("Dropping {} during unit system conversion: {}", name, e),
            }
        }
        converted
    }
}

/// Built-in converter covering the standard weather unit groups
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardUnits;

impl StandardUnits {
    pub fn new() -> Self {
        Self
    }
}

impl UnitConverter for StandardUnits {
    fn group_of(&self, obs: &str) -> Option<UnitGroup> {
        observation_group(obs)
    }

    fn convert(&self, value: f64, from: Unit, to: Unit) -> Result<f64> {
        if from == to {
            return Ok(value);
        }
        if from.group() != to.group() {
            return Err(Error::unit_conversion(from.name(), to.name()));
        }

        let (from_scale, from_offset) = from.to_base();
        let (to_scale, to_offset) = to.to_base();
        let base = value * from_scale + from_offset;
        Ok((base - to_offset) / to_scale)
    }
}
