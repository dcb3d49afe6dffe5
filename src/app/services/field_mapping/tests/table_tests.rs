//! Tests for the resolved field table

use crate::Error;
use crate::app::services::field_mapping::{FieldMap, FieldSpec};
use crate::app::services::units::Unit;

#[test]
fn test_default_layout_matches_channel_schema() {
    let map = FieldMap::default_layout();

    assert_eq!(map.len(), 7);
    let observed: Vec<(&str, &str, &str)> = map
        .iter()
        .map(|(key, spec)| (key, spec.obs.as_str(), spec.format.as_str()))
        .collect();
    assert_eq!(
        observed,
        vec![
            ("field1", "outTemp", "%.1f"),
            ("field2", "outHumidity", "%.0f"),
            ("field3", "windSpeed", "%.1f"),
            ("field4", "windDir", "%03.0f"),
            ("field5", "windGust", "%.1f"),
            ("field6", "barometer", "%.3f"),
            ("field7", "rain", "%.2f"),
        ]
    );
    assert!(map.get("field8").is_none());
    assert!(map.iter().all(|(_, spec)| spec.units.is_none()));
}

#[test]
fn test_field_keys_are_validated() {
    let spec = FieldSpec::new("outTemp", "%.1f").unwrap();

    assert!(FieldMap::new(vec![("field8".to_string(), spec.clone())]).is_ok());

    let err = FieldMap::new(vec![("datetime".to_string(), spec.clone())]).unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
    assert!(err.to_string().contains("reserved"));

    assert!(FieldMap::new(vec![("field9".to_string(), spec.clone())]).is_err());
    assert!(FieldMap::new(vec![("temperature".to_string(), spec)]).is_err());
}

#[test]
fn test_field_spec_builder() {
    let spec = FieldSpec::new("outTemp", "%.2f")
        .unwrap()
        .with_units(Unit::DegreeC)
        .with_label("outdoor");

    assert_eq!(spec.units, Some(Unit::DegreeC));
    assert_eq!(spec.label.as_deref(), Some("outdoor"));
    assert!(FieldSpec::new("", "%.1f").is_err());
    assert!(FieldSpec::new("outTemp", "%q").is_err());
}
