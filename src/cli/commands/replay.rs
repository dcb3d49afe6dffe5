//! Replay command: stream JSON-lines records through the upload worker
//!
//! Acts as the producer. Every decoded record is fed to the in-memory rain
//! archive (for `hourRain`, `rain24` and `dayRain`) and then queued.

use crate::app::adapters::archive::RainArchive;
use crate::app::models::Record;
use crate::cli::args::{Args, ReplayArgs};
use anyhow::Context;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::shared::{build_worker, load_configuration, print_summary};

/// Run the replay command
pub async fn run_replay(
    args: &Args,
    replay_args: &ReplayArgs,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let mut config = load_configuration(args, &replay_args.upload)?;
    if replay_args.post_interval.is_some() {
        config.post_interval = replay_args.post_interval;
    }
    if replay_args.max_backlog.is_some() {
        config.max_backlog = replay_args.max_backlog;
    }
    if replay_args.no_augment {
        config.augment_record = false;
    }

    let archive = Arc::new(RainArchive::new());
    let worker = build_worker(&config)?.with_augmenter(archive.clone());
    let handle = worker.start();

    let progress_bar = if args.show_progress() {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .context("Invalid progress template")?,
        );
        pb.set_message("Replaying records...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let counts = if replay_args.reads_stdin() {
        info!("Replaying records from stdin");
        let reader = BufReader::new(tokio::io::stdin());
        feed_records(reader, &archive, &handle.queue(), &cancel, progress_bar.as_ref()).await?
    } else {
        info!("Replaying records from {}", replay_args.input);
        let file = tokio::fs::File::open(&replay_args.input)
            .await
            .with_context(|| format!("Failed to open {}", replay_args.input))?;
        let reader = BufReader::new(file);
        feed_records(reader, &archive, &handle.queue(), &cancel, progress_bar.as_ref()).await?
    };

    if let Some(pb) = &progress_bar {
        pb.finish_with_message(format!("Queued {} records", counts.queued));
    }
    if counts.invalid > 0 {
        warn!("Skipped {} undecodable line(s)", counts.invalid);
    }

    let summary = handle.shutdown().await?;
    print_summary("Replay Summary", &summary);
    if cancel.is_cancelled() {
        println!("{}", "Replay interrupted before the end of input".yellow());
    }
    Ok(())
}

/// Lines read by the producer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedCounts {
    pub queued: usize,
    pub invalid: usize,
}

/// Decode JSON-lines records and queue them until input ends or `cancel` fires
pub async fn feed_records<R>(
    reader: R,
    archive: &RainArchive,
    queue: &crate::app::services::upload_worker::UploadQueue,
    cancel: &CancellationToken,
    progress: Option<&ProgressBar>,
) -> anyhow::Result<FeedCounts>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut counts = FeedCounts::default();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read input")?,
            _ = cancel.cancelled() => {
                debug!("Replay cancelled after {} records", counts.queued);
                break;
            }
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let record = match Record::from_json(&line) {
            Ok(record) => record,
            Err(e) => {
                debug!("{}", e);
                counts.invalid += 1;
                continue;
            }
        };

        archive.observe(&record)?;
        queue.enqueue(record)?;
        counts.queued += 1;
        if let Some(pb) = progress {
            pb.set_message(format!("Queued {} records", counts.queued));
        }
    }

    Ok(counts)
}
