//! Tests for unit conversion module


use crate::app::models::{Record, UnitSystem};

/// Relative float comparison used throughout the unit tests
pub fn approx_eq(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= 1e-9 * scale
}

/// A US-unit record covering every group the default channel layout uses
pub fn create_us_record() -> Record {
    Record::new(1_700_000_000, UnitSystem::Us)
        .with_value("outTemp", 32.5)
        .with_value("outHumidity", 24)
        .with_value("windSpeed", 10.0)
        .with_value("windDir", 270.0)
        .with_value("windGust", 15.0)
        .with_value("barometer", 30.0)
        .with_value("rain", 0.1)
}
