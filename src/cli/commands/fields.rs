//! Fields command: print the resolved channel layout

use crate::app::services::field_mapping::FieldMap;
use crate::app::services::units::StandardUnits;
use crate::cli::args::{Args, FieldsArgs, UploadOptions};
use anyhow::Context;
use colored::*;

use super::shared::load_configuration;

/// Run the fields command
pub fn run_fields(args: &Args, fields_args: &FieldsArgs) -> anyhow::Result<()> {
    let upload = UploadOptions {
        unit_system: fields_args.unit_system,
        ..Default::default()
    };
    let mut config = load_configuration(args, &upload)?;
    if fields_args.units_label {
        config.mapping.append_units_label = true;
    }

    let fields = config
        .field_map(&StandardUnits::new())
        .context("Invalid channel field configuration")?;

    let system = config
        .unit_system
        .map_or_else(|| "record units".to_string(), |s| s.to_string());
    println!(
        "{} ({})",
        "Channel Field Layout".bright_green().bold(),
        system
    );
    for line in render_fields(&fields) {
        println!("{line}");
    }
    Ok(())
}

/// One line per field: key, observation, format, units and label
pub fn render_fields(fields: &FieldMap) -> Vec<String> {
    fields
        .iter()
        .map(|(key, spec)| {
            format!(
                "  {:<7} {:<14} {:<8} {:<18} {}",
                key,
                spec.obs,
                spec.format.as_str(),
                spec.units.map_or_else(|| "-".to_string(), |u| u.to_string()),
                spec.label.as_deref().unwrap_or("-")
            )
        })
        .collect()
}
