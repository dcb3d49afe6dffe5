//! Tests for request formatter module


use crate::app::models::ApiKey;
use crate::app::services::field_mapping::FieldMap;
use crate::app::services::request_formatter::RequestFormatter;
use crate::app::services::units::StandardUnits;
use crate::constants::DEFAULT_SERVER_URL;
use std::sync::Arc;

pub const TEST_API_KEY: &str = "ABCDEFGH1234";

/// Create a formatter over the given field table with the standard units
pub fn create_formatter(fields: FieldMap) -> RequestFormatter {
    RequestFormatter::new(
        Arc::new(fields),
        Arc::new(StandardUnits::new()),
        DEFAULT_SERVER_URL,
        ApiKey::new(TEST_API_KEY).unwrap(),
    )
    .unwrap()
}
