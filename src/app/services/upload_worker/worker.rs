//! Upload worker construction and drain loop

use crate::app::adapters::archive::SupplementalSource;
use crate::app::adapters::http::UploadTransport;
use crate::app::models::{Record, UploadTask};
use crate::app::services::field_mapping::FieldMap;
use crate::app::services::request_formatter::RequestFormatter;
use crate::app::services::units::UnitConverter;
use crate::config::WorkerConfig;
use crate::{Error, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::observer::{TracingObserver, UploadEvent, UploadObserver};
use super::queue::UploadQueue;
use super::retry::{RetryPolicy, post_with_retries};
use super::stats::WorkerSummary;

/// Where the worker loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting for the queue
    Idle,
    /// Taking queued records and deciding what to publish
    Draining,
    /// Augmenting, formatting and sending one record
    Posting,
    /// Sentinel seen or every queue handle dropped; terminal
    Stopped,
}

/// Background uploader for one ThingSpeak channel
///
/// Construction has no side effects. Call [`start`](Self::start) to spawn
/// the loop on its own task, or await [`run`](Self::run) directly.
pub struct UploadWorker {
    config: WorkerConfig,
    formatter: RequestFormatter,
    transport: Arc<dyn UploadTransport>,
    converter: Arc<dyn UnitConverter>,
    augmenter: Option<Arc<dyn SupplementalSource>>,
    observer: Arc<dyn UploadObserver>,
    queue: UploadQueue,
    receiver: mpsc::UnboundedReceiver<UploadTask>,
    state: watch::Sender<WorkerState>,
}

impl UploadWorker {
    /// Validate the configuration and build the worker
    ///
    /// # Arguments
    ///
    /// * `config` - Worker settings
    /// * `fields` - Resolved channel field table
    /// * `transport` - HTTP transport
    /// * `converter` - Unit adapter for field units and normalisation
    ///
    /// # Returns
    ///
    /// The worker, or a configuration error
    pub fn new(
        config: WorkerConfig,
        fields: FieldMap,
        transport: Arc<dyn UploadTransport>,
        converter: Arc<dyn UnitConverter>,
    ) -> Result<Self> {
        config.validate()?;

        let formatter = RequestFormatter::new(
            Arc::new(fields),
            Arc::clone(&converter),
            &config.server_url,
            config.api_key.clone(),
        )?;
        let observer = Arc::new(TracingObserver::new(config.log_success, config.log_failure));
        let (queue, receiver) = UploadQueue::channel();
        let (state, _) = watch::channel(WorkerState::Idle);

        debug!(
            "{}: worker for {} with key {} ({} fields)",
            config.protocol_name,
            formatter.server_url(),
            config.api_key,
            formatter.fields().len()
        );

        Ok(Self {
            config,
            formatter,
            transport,
            converter,
            augmenter: None,
            observer,
            queue,
            receiver,
            state,
        })
    }

    /// Attach a supplemental source used when `augment_record` is set
    pub fn with_augmenter(mut self, augmenter: Arc<dyn SupplementalSource>) -> Self {
        self.augmenter = Some(augmenter);
        self
    }

    /// Replace the default tracing observer
    pub fn with_observer(mut self, observer: Arc<dyn UploadObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// A producer handle for this worker's queue
    pub fn queue(&self) -> UploadQueue {
        self.queue.clone()
    }

    /// Watch the worker state
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    /// Spawn the loop on its own task
    pub fn start(self) -> WorkerHandle {
        let queue = self.queue();
        let state = self.subscribe();
        let task = tokio::spawn(self.run());
        WorkerHandle { queue, state, task }
    }

    /// Drain the queue until the sentinel arrives or every producer is gone
    pub async fn run(self) -> WorkerSummary {
        let UploadWorker {
            config,
            formatter,
            transport,
            converter,
            augmenter,
            observer,
            queue,
            receiver,
            state,
        } = self;
        // Only producers keep the channel open from here on
        drop(queue);

        let augmenter = augmenter.filter(|_| config.augment_record);
        let drain = DrainLoop {
            policy: RetryPolicy::from_config(&config),
            config,
            formatter,
            transport,
            converter,
            augmenter,
            observer,
            state,
            last_post: None,
            summary: WorkerSummary::new(),
        };
        drain.run(receiver).await
    }
}

/// Handle to a spawned worker
pub struct WorkerHandle {
    queue: UploadQueue,
    state: watch::Receiver<WorkerState>,
    task: JoinHandle<WorkerSummary>,
}

impl WorkerHandle {
    /// A producer handle for the worker's queue
    pub fn queue(&self) -> UploadQueue {
        self.queue.clone()
    }

    /// Hand a record to the worker
    pub fn enqueue(&self, record: Record) -> Result<()> {
        self.queue.enqueue(record)
    }

    /// Current worker state
    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    /// Watch the worker state
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.clone()
    }

    /// Send the sentinel and wait for the worker to finish the queue
    pub async fn shutdown(self) -> Result<WorkerSummary> {
        // Already stopped is fine, the join below still returns its summary
        let _ = self.queue.shutdown();
        self.join().await
    }

    /// Wait for the worker to stop on its own
    pub async fn join(self) -> Result<WorkerSummary> {
        self.task
            .await
            .map_err(|e| Error::worker_task(e.to_string()))
    }
}

// =============================================================================
// Drain Loop
// =============================================================================

struct DrainLoop {
    config: WorkerConfig,
    policy: RetryPolicy,
    formatter: RequestFormatter,
    transport: Arc<dyn UploadTransport>,
    converter: Arc<dyn UnitConverter>,
    augmenter: Option<Arc<dyn SupplementalSource>>,
    observer: Arc<dyn UploadObserver>,
    state: watch::Sender<WorkerState>,
    last_post: Option<i64>,
    summary: WorkerSummary,
}

impl DrainLoop {
    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<UploadTask>) -> WorkerSummary {
        info!("{}: upload worker started", self.config.protocol_name);

        loop {
            self.set_state(WorkerState::Idle);
            let Some(first) = receiver.recv().await else {
                debug!("{}: all queue handles dropped", self.config.protocol_name);
                break;
            };

            self.set_state(WorkerState::Draining);
            let (batch, stop) = drain_batch(first, &mut receiver);
            let batch = self.enforce_backlog(batch);
            for record in batch {
                self.process(record).await;
            }

            if stop {
                debug!("{}: shutdown requested", self.config.protocol_name);
                break;
            }
        }

        self.set_state(WorkerState::Stopped);
        info!("{}: upload worker stopped: {}", self.config.protocol_name, self.summary);
        self.summary
    }

    fn set_state(&self, state: WorkerState) {
        self.state.send_replace(state);
    }

    fn emit(&self, event: UploadEvent) {
        self.observer.on_event(&self.config.protocol_name, &event);
    }

    fn enforce_backlog(&mut self, mut batch: Vec<Record>) -> Vec<Record> {
        self.summary.received += batch.len();

        let Some(max_backlog) = self.config.max_backlog else {
            return batch;
        };
        if batch.len() > max_backlog {
            let excess = batch.len() - max_backlog;
            batch.drain(..excess);
            self.summary.discarded_backlog += excess;
            self.emit(UploadEvent::BacklogDiscarded { count: excess });
        }
        batch
    }

    async fn process(&mut self, record: Record) {
        let date_time = record.date_time;

        if let (Some(interval), Some(last_post)) = (self.config.post_interval, self.last_post) {
            // A gap too large for i64 is never within the interval
            let within = date_time
                .checked_sub(last_post)
                .is_some_and(|elapsed| elapsed < duration_secs(interval));
            if within {
                self.summary.skipped_interval += 1;
                self.emit(UploadEvent::SkippedInterval {
                    date_time,
                    last_post,
                });
                return;
            }
        }

        if let Some(stale) = self.config.stale {
            // An age too large for i64 is treated as fresh
            let age = Utc::now().timestamp().checked_sub(date_time);
            if let Some(age_secs) = age.filter(|age| *age > duration_secs(stale)) {
                self.summary.skipped_stale += 1;
                self.emit(UploadEvent::SkippedStale {
                    date_time,
                    age_secs,
                });
                return;
            }
        }

        // Paces the next record whether or not this post succeeds
        self.last_post = Some(date_time);

        self.set_state(WorkerState::Posting);
        self.post(record).await;
        self.set_state(WorkerState::Draining);
    }

    async fn post(&mut self, record: Record) {
        let date_time = record.date_time;
        let record = self.augment(record).await;
        let record = match self.config.unit_system {
            Some(system) => self.converter.to_system(&record, system),
            None => record,
        };

        let request = match self.formatter.format(&record) {
            Ok(request) => request,
            Err(e) => {
                self.summary.failed += 1;
                self.emit(UploadEvent::Failed {
                    date_time,
                    error: e.to_string(),
                });
                return;
            }
        };

        if self.config.skip_upload {
            self.summary.skipped_upload += 1;
            self.emit(UploadEvent::SkippedUpload { date_time });
            return;
        }

        let observer = Arc::clone(&self.observer);
        let protocol = self.config.protocol_name.clone();
        let mut attempts = 0;
        let outcome = post_with_retries(
            &*self.transport,
            &request,
            &self.policy,
            |attempt, error| {
                attempts = attempt;
                observer.on_event(
                    &protocol,
                    &UploadEvent::AttemptFailed {
                        date_time,
                        attempt,
                        error: error.to_string(),
                    },
                );
            },
        )
        .await;

        match outcome {
            Ok(used) => {
                self.summary.attempts += used as usize;
                self.summary.posted += 1;
                self.emit(UploadEvent::Posted {
                    date_time,
                    attempts: used,
                });
            }
            Err(e) => {
                self.summary.attempts += attempts as usize;
                self.summary.failed += 1;
                self.emit(UploadEvent::Failed {
                    date_time,
                    error: e.to_string(),
                });
            }
        }
    }

    async fn augment(&mut self, mut record: Record) -> Record {
        let Some(augmenter) = &self.augmenter else {
            return record;
        };

        match augmenter.get_supplemental_fields(&record).await {
            Ok(supplement) => {
                let filled = record.merge_missing(&supplement);
                debug!("Augmented record {} with {} value(s)", record.date_time, filled);
            }
            Err(e) => {
                self.summary.augment_failures += 1;
                self.emit(UploadEvent::AugmentFailed {
                    date_time: record.date_time,
                    error: e.to_string(),
                });
            }
        }
        record
    }
}

/// Whole seconds of `duration`, saturating at `i64::MAX`
fn duration_secs(duration: Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}

/// Take everything queued behind `first`, stopping at the sentinel
///
/// Records queued after the sentinel are left unread.
fn drain_batch(
    first: UploadTask,
    receiver: &mut mpsc::UnboundedReceiver<UploadTask>,
) -> (Vec<Record>, bool) {
    let mut batch = Vec::new();
    let mut next = Some(first);
    while let Some(task) = next {
        match task {
            UploadTask::Record(record) => batch.push(record),
            UploadTask::Shutdown => return (batch, true),
        }
        next = receiver.try_recv().ok();
    }
    (batch, false)
}
