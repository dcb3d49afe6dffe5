//! Unit conversion for weather observations
//!
//! Records arrive in the unit system the station archive uses (US, METRIC or
//! METRICWX). Channel fields may ask for a specific unit, and the worker may
//! normalise whole records into a target system. Both go through the
//! [`UnitConverter`] trait.
//!
//! # Architecture
//!
//! - [`unit`] - `Unit` and `UnitGroup` enums, linear maps to each group's base unit
//! - [`observations`] - observation name to unit group table
//! - [`converter`] - the `UnitConverter` trait and the `StandardUnits` implementation
//!
//! # Example Usage
//!
//! ```rust
//! use thingspeak_uplink::app::services::units::{StandardUnits, Unit, UnitConverter};
//!
//! let units = StandardUnits::new();
//! let celsius = units.convert(212.0, Unit::DegreeF, Unit::DegreeC).unwrap();
//! assert!((celsius - 100.0).abs() < 1e-9);
//! ```

pub mod converter;
pub mod observations;
pub mod unit;

#[cfg(test)]
pub mod tests;

pub use converter::{StandardUnits, UnitConverter};
pub use observations::observation_group;
pub use unit::{Unit, UnitGroup};
