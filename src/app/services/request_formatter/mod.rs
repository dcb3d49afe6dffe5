//! ThingSpeak update request formatting
//!
//! Turns one [`Record`](crate::Record) into the GET request the ThingSpeak
//! update endpoint expects: a `datetime` parameter, one parameter per mapped
//! channel field, and the write key in the `THINGSPEAKAPIKEY` header.
//!
//! Formatting is pure. The same record and field table always produce the
//! same request, and nothing here touches the network.
//!
//! # Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use thingspeak_uplink::app::models::ApiKey;
//! use thingspeak_uplink::app::services::field_mapping::FieldMap;
//! use thingspeak_uplink::app::services::request_formatter::RequestFormatter;
//! use thingspeak_uplink::app::services::units::StandardUnits;
//! use thingspeak_uplink::{Record, UnitSystem};
//!
//! let formatter = RequestFormatter::new(
//!     Arc::new(FieldMap::default_layout()),
//!     Arc::new(StandardUnits::new()),
//!     "http://api.thingspeak.com/update",
//!     ApiKey::new("ABCDEFGH1234").unwrap(),
//! )
//! .unwrap();
//!
//! let record = Record::new(1_700_000_000, UnitSystem::Us).with_value("outTemp", 32.5);
//! let request = formatter.format(&record).unwrap();
//! assert_eq!(request.param("field1"), Some("32.5".to_string()));
//! ```

pub mod formatter;

#[cfg(test)]
pub mod tests;

pub use formatter::{RequestFormatter, UploadRequest, format_timestamp};
