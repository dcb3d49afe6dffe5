//! Tests for field mapping module

pub mod table_tests;

use super::FieldOverride;

/// Create an override naming only the observation
pub fn create_obs_override(obs: &str) -> FieldOverride {
    FieldOverride {
        obs: Some(obs.to_string()),
        ..Default::default()
    }
}
