//! Unit and unit-group definitions
//!
//! Every unit belongs to exactly one group and is related to the group's base
//! unit by a linear map `base = scale * value + offset`. Conversion between two
//! units of the same group goes through the base unit.

use crate::app::models::UnitSystem;
use crate::constants::UNIT_REDUCTIONS;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Family of mutually convertible units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitGroup {
    Temperature,
    Pressure,
    Speed,
    /// Vector-averaged speeds and gusts
    Speed2,
    Rain,
    RainRate,
    Altitude,
    Distance,
    Percent,
    Direction,
    Radiation,
    Uv,
    Time,
    Volt,
    Interval,
}

impl UnitGroup {
    /// Native unit of this group under a unit system
    pub fn unit_in(self, system: UnitSystem) -> Unit {
        use UnitSystem::{Metric, MetricWx, Us};
        match (self, system) {
            (UnitGroup::Temperature, Us) => Unit::DegreeF,
            (UnitGroup::Temperature, Metric | MetricWx) => Unit::DegreeC,
            (UnitGroup::Pressure, Us) => Unit::InHg,
            (UnitGroup::Pressure, Metric | MetricWx) => Unit::Mbar,
            (UnitGroup::Speed, Us) => Unit::MilePerHour,
            (UnitGroup::Speed, Metric) => Unit::KmPerHour,
            (UnitGroup::Speed, MetricWx) => Unit::MeterPerSecond,
            (UnitGroup::Speed2, Us) => Unit::MilePerHour2,
            (UnitGroup::Speed2, Metric) => Unit::KmPerHour2,
            (UnitGroup::Speed2, MetricWx) => Unit::MeterPerSecond2,
            (UnitGroup::Rain, Us) => Unit::Inch,
            (UnitGroup::Rain, Metric) => Unit::Cm,
            (UnitGroup::Rain, MetricWx) => Unit::Mm,
            (UnitGroup::RainRate, Us) => Unit::InchPerHour,
            (UnitGroup::RainRate, Metric) => Unit::CmPerHour,
            (UnitGroup::RainRate, MetricWx) => Unit::MmPerHour,
            (UnitGroup::Altitude, Us) => Unit::Foot,
            (UnitGroup::Altitude, Metric | MetricWx) => Unit::Meter,
            (UnitGroup::Distance, Us) => Unit::Mile,
            (UnitGroup::Distance, Metric | MetricWx) => Unit::Km,
            (UnitGroup::Percent, _) => Unit::Percent,
            (UnitGroup::Direction, _) => Unit::DegreeCompass,
            (UnitGroup::Radiation, _) => Unit::WattPerMeterSquared,
            (UnitGroup::Uv, _) => Unit::UvIndex,
            (UnitGroup::Time, _) => Unit::UnixEpoch,
            (UnitGroup::Volt, _) => Unit::Volt,
            (UnitGroup::Interval, _) => Unit::Minute,
        }
    }
}

/// A concrete measurement unit, named as in station configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Unit {
    DegreeF,
    DegreeC,
    DegreeK,
    InHg,
    Mbar,
    HPa,
    KPa,
    MmHg,
    MilePerHour,
    KmPerHour,
    MeterPerSecond,
    Knot,
    MilePerHour2,
    KmPerHour2,
    MeterPerSecond2,
    Knot2,
    Inch,
    Cm,
    Mm,
    InchPerHour,
    CmPerHour,
    MmPerHour,
    Foot,
    Meter,
    Mile,
    Km,
    Percent,
    DegreeCompass,
    WattPerMeterSquared,
    UvIndex,
    UnixEpoch,
    Volt,
    Minute,
}

impl Unit {
    /// Every known unit
    pub const ALL: [Unit; 33] = [
        Unit::DegreeF,
        Unit::DegreeC,
        Unit::DegreeK,
        Unit::InHg,
        Unit::Mbar,
        Unit::HPa,
        Unit::KPa,
        Unit::MmHg,
        Unit::MilePerHour,
        Unit::KmPerHour,
        Unit::MeterPerSecond,
        Unit::Knot,
        Unit::MilePerHour2,
        Unit::KmPerHour2,
        Unit::MeterPerSecond2,
        Unit::Knot2,
        Unit::Inch,
        Unit::Cm,
        Unit::Mm,
        Unit::InchPerHour,
        Unit::CmPerHour,
        Unit::MmPerHour,
        Unit::Foot,
        Unit::Meter,
        Unit::Mile,
        Unit::Km,
        Unit::Percent,
        Unit::DegreeCompass,
        Unit::WattPerMeterSquared,
        Unit::UvIndex,
        Unit::UnixEpoch,
        Unit::Volt,
        Unit::Minute,
    ];

    /// Configuration name of the unit
    pub fn name(self) -> &'static str {
        match self {
            Unit::DegreeF => "degree_F",
            Unit::DegreeC => "degree_C",
            Unit::DegreeK => "degree_K",
            Unit::InHg => "inHg",
            Unit::Mbar => "mbar",
            Unit::HPa => "hPa",
            Unit::KPa => "kPa",
            Unit::MmHg => "mmHg",
            Unit::MilePerHour => "mile_per_hour",
            Unit::KmPerHour => "km_per_hour",
            Unit::MeterPerSecond => "meter_per_second",
            Unit::Knot => "knot",
            Unit::MilePerHour2 => "mile_per_hour2",
            Unit::KmPerHour2 => "km_per_hour2",
            Unit::MeterPerSecond2 => "meter_per_second2",
            Unit::Knot2 => "knot2",
            Unit::Inch => "inch",
            Unit::Cm => "cm",
            Unit::Mm => "mm",
            Unit::InchPerHour => "inch_per_hour",
            Unit::CmPerHour => "cm_per_hour",
            Unit::MmPerHour => "mm_per_hour",
            Unit::Foot => "foot",
            Unit::Meter => "meter",
            Unit::Mile => "mile",
            Unit::Km => "km",
            Unit::Percent => "percent",
            Unit::DegreeCompass => "degree_compass",
            Unit::WattPerMeterSquared => "watt_per_meter_squared",
            Unit::UvIndex => "uv_index",
            Unit::UnixEpoch => "unix_epoch",
            Unit::Volt => "volt",
            Unit::Minute => "minute",
        }
    }

    /// Group the unit belongs to
    pub fn group(self) -> UnitGroup {
        match self {
            Unit::DegreeF | Unit::DegreeC | Unit::DegreeK => UnitGroup::Temperature,
            Unit::InHg | Unit::Mbar | Unit::HPa | Unit::KPa | Unit::MmHg => UnitGroup::Pressure,
            Unit::MilePerHour | Unit::KmPerHour | Unit::MeterPerSecond | Unit::Knot => {
                UnitGroup::Speed
            }
            Unit::MilePerHour2 | Unit::KmPerHour2 | Unit::MeterPerSecond2 | Unit::Knot2 => {
                UnitGroup::Speed2
            }
            Unit::Inch | Unit::Cm | Unit::Mm => UnitGroup::Rain,
            Unit::InchPerHour | Unit::CmPerHour | Unit::MmPerHour => UnitGroup::RainRate,
            Unit::Foot | Unit::Meter => UnitGroup::Altitude,
            Unit::Mile | Unit::Km => UnitGroup::Distance,
            Unit::Percent => UnitGroup::Percent,
            Unit::DegreeCompass => UnitGroup::Direction,
            Unit::WattPerMeterSquared => UnitGroup::Radiation,
            Unit::UvIndex => UnitGroup::Uv,
            Unit::UnixEpoch => UnitGroup::Time,
            Unit::Volt => UnitGroup::Volt,
            Unit::Minute => UnitGroup::Interval,
        }
    }

    /// Linear map to the group's base unit as `(scale, offset)`
    ///
    /// Bases: degree_C, mbar, meter_per_second, mm, mm_per_hour, meter, km.
    pub(crate) fn to_base(self) -> (f64, f64) {
        const MPH_TO_MPS: f64 = 0.44704;
        const KNOT_TO_MPS: f64 = 1852.0 / 3600.0;
        const KPH_TO_MPS: f64 = 1.0 / 3.6;
        match self {
            Unit::DegreeC => (1.0, 0.0),
            Unit::DegreeF => (5.0 / 9.0, -32.0 * 5.0 / 9.0),
            Unit::DegreeK => (1.0, -273.15),
            Unit::Mbar | Unit::HPa => (1.0, 0.0),
            Unit::InHg => (33.863_886_666_7, 0.0),
            Unit::KPa => (10.0, 0.0),
            Unit::MmHg => (1.333_223_874_15, 0.0),
            Unit::MeterPerSecond | Unit::MeterPerSecond2 => (1.0, 0.0),
            Unit::MilePerHour | Unit::MilePerHour2 => (MPH_TO_MPS, 0.0),
            Unit::KmPerHour | Unit::KmPerHour2 => (KPH_TO_MPS, 0.0),
            Unit::Knot | Unit::Knot2 => (KNOT_TO_MPS, 0.0),
            Unit::Mm | Unit::MmPerHour => (1.0, 0.0),
            Unit::Cm | Unit::CmPerHour => (10.0, 0.0),
            Unit::Inch | Unit::InchPerHour => (25.4, 0.0),
            Unit::Meter => (1.0, 0.0),
            Unit::Foot => (0.3048, 0.0),
            Unit::Km => (1.0, 0.0),
            Unit::Mile => (1.609_344, 0.0),
            Unit::Percent
            | Unit::DegreeCompass
            | Unit::WattPerMeterSquared
            | Unit::UvIndex
            | Unit::UnixEpoch
            | Unit::Volt
            | Unit::Minute => (1.0, 0.0),
        }
    }

    /// Short label token for field names, `None` when the unit takes no suffix
    pub fn label_suffix(self) -> Option<&'static str> {
        let name = self.name();
        match UNIT_REDUCTIONS.iter().find(|(verbose, _)| *verbose == name) {
            Some((_, reduced)) => *reduced,
            None => Some(name),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Unit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Unit::ALL
            .iter()
            .copied()
            .find(|unit| unit.name() == trimmed)
            .ok_or_else(|| Error::configuration(format!("Unknown unit '{trimmed}'")))
    }
}

impl TryFrom<String> for Unit {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.name().to_string()
    }
}
