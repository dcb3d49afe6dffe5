//! Background upload worker
//!
//! The producer hands records to an [`UploadQueue`] and never waits on the
//! network. A single worker task drains the queue, decides which records to
//! publish, and posts them one at a time with bounded retry.
//!
//! # Architecture
//!
//! - [`queue`] - producer-side handle over an unbounded channel
//! - [`worker`] - construction, the drain loop and the state machine
//! - [`retry`] - attempt loop and response checking
//! - [`observer`] - upload events and the tracing-backed logger
//! - [`stats`] - counters returned when the worker stops
//!
//! # Per-record pipeline
//!
//! 1. Pacing against the last posted record timestamp
//! 2. Staleness against the wall clock
//! 3. Augmentation from the supplemental source
//! 4. Normalisation to the configured unit system
//! 5. Formatting, then upload (unless uploads are skipped)
//!
//! Uploads are best-effort and at-most-once: a record that fails every
//! attempt is dropped, never requeued.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use thingspeak_uplink::app::adapters::http::ReqwestTransport;
//! use thingspeak_uplink::app::models::ApiKey;
//! use thingspeak_uplink::app::services::field_mapping::FieldMap;
//! use thingspeak_uplink::app::services::units::StandardUnits;
//! use thingspeak_uplink::app::services::upload_worker::UploadWorker;
//! use thingspeak_uplink::{Record, UnitSystem, WorkerConfig};
//!
//! # async fn example() -> thingspeak_uplink::Result<()> {
//! let config = WorkerConfig::new(ApiKey::new("ABCDEFGH1234")?);
//! let transport = Arc::new(ReqwestTransport::new(config.timeout)?);
//! let worker = UploadWorker::new(
//!     config,
//!     FieldMap::default_layout(),
//!     transport,
//!     Arc::new(StandardUnits::new()),
//! )?;
//!
//! let handle = worker.start();
//! handle.enqueue(Record::new(1_700_000_000, UnitSystem::Us).with_value("outTemp", 32.5))?;
//! let summary = handle.shutdown().await?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```

pub mod observer;
pub mod queue;
pub mod retry;
pub mod stats;
pub mod worker;

#[cfg(test)]
pub mod tests;

pub use observer::{TracingObserver, UploadEvent, UploadObserver};
pub use queue::UploadQueue;
pub use retry::{RetryPolicy, check_response, post_with_retries};
pub use stats::WorkerSummary;
pub use worker::{UploadWorker, WorkerHandle, WorkerState};
