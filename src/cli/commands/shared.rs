//! Shared components for CLI commands

use crate::app::adapters::http::ReqwestTransport;
use crate::app::services::units::StandardUnits;
use crate::app::services::upload_worker::{UploadWorker, WorkerSummary};
use crate::cli::args::{Args, UploadOptions};
use crate::config::UplinkConfig;
use anyhow::Context;
use colored::*;
use std::sync::Arc;
use tracing::debug;

/// Set up structured logging
pub fn setup_logging(args: &Args) -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("thingspeak_uplink={}", log_level)));

    if args.quiet {
        // Minimal logging for quiet mode
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .context("Failed to initialise logging")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .context("Failed to initialise logging")?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Load configuration using the layered approach (file -> env -> args)
pub fn load_configuration(args: &Args, upload: &UploadOptions) -> anyhow::Result<UplinkConfig> {
    let config = UplinkConfig::load(args.config_file.as_deref())
        .context("Failed to load configuration file")?
        .apply_env()
        .context("Invalid environment configuration")?;
    Ok(upload.apply(config))
}

/// Build an upload worker with the real HTTP transport
pub fn build_worker(config: &UplinkConfig) -> anyhow::Result<UploadWorker> {
    let units = Arc::new(StandardUnits::new());
    let worker_config = config.worker_config()?;
    let fields = config
        .field_map(&*units)
        .context("Invalid channel field configuration")?;
    let transport = Arc::new(ReqwestTransport::new(worker_config.timeout)?);

    Ok(UploadWorker::new(worker_config, fields, transport, units)?)
}

/// Print the worker summary
pub fn print_summary(title: &str, summary: &WorkerSummary) {
    println!("\n{}", title.bright_green().bold());
    println!(
        "  Received:  {}",
        summary.received.to_string().bright_white().bold()
    );
    println!(
        "  Posted:    {}",
        summary.posted.to_string().bright_green().bold()
    );
    if summary.failed > 0 {
        println!(
            "  Failed:    {}",
            summary.failed.to_string().bright_red().bold()
        );
    }
    if summary.skipped() > 0 {
        println!(
            "  Skipped:   {} ({} interval, {} stale, {} not uploaded, {} backlog)",
            summary.skipped().to_string().yellow().bold(),
            summary.skipped_interval,
            summary.skipped_stale,
            summary.skipped_upload,
            summary.discarded_backlog
        );
    }
    println!("  Attempts:  {}", summary.attempts);
}
