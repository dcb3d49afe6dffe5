//! Command-line argument definitions for the ThingSpeak uplink
//!
//! This module defines the CLI interface using the clap derive API. Options
//! given here override the configuration file and the environment.

use crate::app::models::UnitSystem;
use crate::config::UplinkConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the ThingSpeak uplink
///
/// Publishes weather station archive records to a ThingSpeak channel.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "thingspeak-uplink",
    version,
    about = "Publish weather station archive records to a ThingSpeak channel",
    long_about = "Republishes locally recorded weather observations to a ThingSpeak channel. \
                  Records are mapped onto the eight channel fields with printf-style formats, \
                  optionally converted to another unit system, and posted by a background worker \
                  with pacing, staleness checks and bounded retry."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (TOML)
    ///
    /// Defaults to ~/.config/thingspeak-uplink/config.toml when that file exists.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        global = true,
        help = "Configuration file (TOML)"
    )]
    pub config_file: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    ///
    /// Only show errors. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Post one synthetic record to check credentials and connectivity
    Selftest(SelftestArgs),
    /// Stream JSON-lines records through the upload worker
    Replay(ReplayArgs),
    /// Print the resolved channel field layout
    Fields(FieldsArgs),
}

/// Upload options shared by the commands that post records
#[derive(Debug, Clone, Default, clap::Args)]
pub struct UploadOptions {
    /// Channel write API key
    #[arg(long = "api-key", value_name = "KEY", help = "Channel write API key")]
    pub api_key: Option<String>,

    /// Update endpoint
    #[arg(long = "server-url", value_name = "URL", help = "Update endpoint URL")]
    pub server_url: Option<String>,

    /// Target unit system (US, METRIC, METRICWX or a numeric code)
    #[arg(
        long = "unit-system",
        value_name = "SYSTEM",
        help = "Convert records to this unit system (US, METRIC, METRICWX)"
    )]
    pub unit_system: Option<UnitSystem>,

    /// Format records but do not send them
    #[arg(long = "skip-upload", help = "Format records without sending them")]
    pub skip_upload: bool,
}

impl UploadOptions {
    /// Apply the command-line layer on top of file and environment settings
    pub fn apply(&self, mut config: UplinkConfig) -> UplinkConfig {
        if let Some(api_key) = &self.api_key {
            config = config.with_api_key(api_key.clone());
        }
        if let Some(server_url) = &self.server_url {
            config = config.with_server_url(server_url.clone());
        }
        if let Some(unit_system) = self.unit_system {
            config = config.with_unit_system(unit_system);
        }
        if self.skip_upload {
            config = config.with_skip_upload();
        }
        config
    }
}

/// Arguments for the selftest command
#[derive(Debug, Clone, Parser)]
pub struct SelftestArgs {
    #[command(flatten)]
    pub upload: UploadOptions,
}

/// Arguments for the replay command
#[derive(Debug, Clone, Parser)]
pub struct ReplayArgs {
    /// JSON-lines file of archive records, or `-` for stdin
    #[arg(value_name = "FILE", default_value = "-")]
    pub input: String,

    #[command(flatten)]
    pub upload: UploadOptions,

    /// Seconds between posted record timestamps
    #[arg(long = "post-interval", value_name = "SECS")]
    pub post_interval: Option<u64>,

    /// Most records kept per drain
    #[arg(long = "max-backlog", value_name = "N")]
    pub max_backlog: Option<usize>,

    /// Do not derive rain totals from the replayed records
    #[arg(long = "no-augment", help = "Do not add hourRain, rain24 and dayRain")]
    pub no_augment: bool,
}

impl ReplayArgs {
    /// Whether the input is standard input
    pub fn reads_stdin(&self) -> bool {
        self.input == "-"
    }
}

/// Arguments for the fields command
#[derive(Debug, Clone, Parser)]
pub struct FieldsArgs {
    /// Unit system used for derived labels
    #[arg(long = "unit-system", value_name = "SYSTEM")]
    pub unit_system: Option<UnitSystem>,

    /// Derive `<obs>_<unit>` labels
    #[arg(long = "units-label", help = "Derive <obs>_<unit> labels")]
    pub units_label: bool,
}

impl Args {
    /// Get the appropriate log level based on verbosity settings
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    /// Check if we should show progress spinners (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}
