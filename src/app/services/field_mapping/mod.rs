//! Channel field mapping for ThingSpeak uploads
//!
//! A ThingSpeak channel has eight numeric fields plus the entry timestamp.
//! This module describes which observation feeds which field, how its value
//! is formatted, and which unit it is reported in.
//!
//! # Architecture
//!
//! - [`printf`] - printf-style numeric formats (`%.1f`, `%03.0f`, ...)
//! - [`table`] - `FieldSpec` and the resolved `FieldMap`
//! - [`resolve`] - configuration overrides and unit-suffixed labels
//!
//! # Default Layout
//!
//! | Field  | Observation | Format   |
//! |--------|-------------|----------|
//! | field1 | outTemp     | `%.1f`   |
//! | field2 | outHumidity | `%.0f`   |
//! | field3 | windSpeed   | `%.1f`   |
//! | field4 | windDir     | `%03.0f` |
//! | field5 | windGust    | `%.1f`   |
//! | field6 | barometer   | `%.3f`   |
//! | field7 | rain        | `%.2f`   |

pub mod printf;
pub mod resolve;
pub mod table;

#[cfg(test)]
pub mod tests;

pub use printf::NumberFormat;
pub use resolve::{FieldMappingConfig, FieldOverride, resolve_field_map, units_label};
pub use table::{FieldMap, FieldSpec};
