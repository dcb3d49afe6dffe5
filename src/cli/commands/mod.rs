//! Command implementations for the ThingSpeak uplink CLI
//!
//! Each command lives in its own module:
//! - `selftest`: post one synthetic record end to end
//! - `replay`: stream JSON-lines records through the upload worker
//! - `fields`: print the resolved channel field layout

pub mod fields;
pub mod replay;
pub mod selftest;
pub mod shared;

use crate::cli::args::{Args, Commands};
use tokio_util::sync::CancellationToken;

/// Main command runner
///
/// Dispatches to the subcommand handler. `cancel` is triggered on Ctrl+C;
/// long-running commands stop feeding the worker and let it drain.
pub async fn run(args: Args, cancel: CancellationToken) -> anyhow::Result<()> {
    shared::setup_logging(&args)?;

    match &args.command {
        Some(Commands::Selftest(selftest_args)) => {
            selftest::run_selftest(&args, selftest_args).await
        }
        Some(Commands::Replay(replay_args)) => {
            replay::run_replay(&args, replay_args, cancel).await
        }
        Some(Commands::Fields(fields_args)) => fields::run_fields(&args, fields_args),
        None => Ok(()),
    }
}
