//! Selftest command: post one synthetic record end to end

use crate::app::models::{Record, UnitSystem};
use crate::cli::args::{Args, SelftestArgs};
use anyhow::bail;
use chrono::Utc;
use colored::*;
use tracing::info;

use super::shared::{build_worker, load_configuration, print_summary};

/// Build the synthetic record posted by the selftest
///
/// Values are plausible US-unit readings so every default field is filled.
pub fn synthetic_record(date_time: i64) -> Record {
    Record::new(date_time, UnitSystem::Us)
        .with_value("outTemp", 68.0)
        .with_value("outHumidity", 45.0)
        .with_value("windSpeed", 3.5)
        .with_value("windDir", 270.0)
        .with_value("windGust", 6.0)
        .with_value("barometer", 29.92)
        .with_value("rain", 0.0)
}

/// Run the selftest command
pub async fn run_selftest(args: &Args, selftest_args: &SelftestArgs) -> anyhow::Result<()> {
    let config = load_configuration(args, &selftest_args.upload)?;
    let skip_upload = config.skip_upload;
    let worker = build_worker(&config)?;

    println!(
        "{} {}",
        "Posting test record to".bright_green().bold(),
        config.server_url.bright_white()
    );

    let record = synthetic_record(Utc::now().timestamp());
    info!("Selftest record: {}", serde_json::to_string(&record)?);

    let handle = worker.start();
    handle.enqueue(record)?;
    let summary = handle.shutdown().await?;

    print_summary("Selftest Summary", &summary);

    if !skip_upload && summary.posted == 0 {
        bail!("Test record was not accepted by {}", config.server_url);
    }
    Ok(())
}
