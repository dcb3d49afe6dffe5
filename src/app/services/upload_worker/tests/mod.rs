//! Tests for upload worker module

pub mod retry_tests;
pub mod worker_tests;

use crate::app::adapters::archive::SupplementalSource;
use crate::app::adapters::http::{TransportResponse, UploadTransport};
use crate::app::models::{ApiKey, Record};
use crate::app::services::field_mapping::FieldMap;
use crate::app::services::request_formatter::UploadRequest;
use crate::app::services::units::StandardUnits;
use crate::app::services::upload_worker::{UploadEvent, UploadObserver, UploadWorker, WorkerState};
use crate::config::WorkerConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

pub const TEST_API_KEY: &str = "ABCDEFGH1234";

/// One scripted transport outcome
#[derive(Debug, Clone)]
pub enum Scripted {
    Respond(u16, &'static str),
    Fail(&'static str),
    Hang,
}

/// A request as the transport saw it
#[derive(Debug, Clone)]
pub struct SentRequest {
    pub request: UploadRequest,
    pub at: Instant,
    pub state: Option<WorkerState>,
}

/// Transport replaying scripted outcomes, then answering `200 "1"`
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    sent: Mutex<Vec<SentRequest>>,
    state: Mutex<Option<watch::Receiver<WorkerState>>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        })
    }

    /// Transport that fails every request with the given outcome
    pub fn always(outcome: Scripted, times: usize) -> Arc<Self> {
        Self::new(vec![outcome; times])
    }

    /// Record the worker state seen at every send
    pub fn watch_state(&self, state: watch::Receiver<WorkerState>) {
        *self.state.lock().unwrap() = Some(state);
    }

    pub fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().unwrap().clone()
    }

    /// `datetime` parameter of every request, in order
    pub fn sent_datetimes(&self) -> Vec<String> {
        self.sent()
            .iter()
            .filter_map(|s| s.request.param("datetime"))
            .collect()
    }
}

#[async_trait]
impl UploadTransport for ScriptedTransport {
    async fn send(&self, request: &UploadRequest) -> Result<TransportResponse> {
        let state = self.state.lock().unwrap().as_ref().map(|rx| *rx.borrow());
        self.sent.lock().unwrap().push(SentRequest {
            request: request.clone(),
            at: Instant::now(),
            state,
        });

        let next = self.script.lock().unwrap().pop_front();
        match next {
            None => Ok(TransportResponse::new(200, "1")),
            Some(Scripted::Respond(status, body)) => Ok(TransportResponse::new(status, body)),
            Some(Scripted::Fail(message)) => Err(Error::transport(message)),
            Some(Scripted::Hang) => {
                tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
                Ok(TransportResponse::new(200, "1"))
            }
        }
    }
}

/// Observer keeping every event
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<UploadEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<UploadEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl UploadObserver for RecordingObserver {
    fn on_event(&self, _protocol: &str, event: &UploadEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Supplemental source returning a fixed record, or failing
pub struct StaticSource {
    pub supplement: Option<Record>,
    pub calls: Mutex<usize>,
}

impl StaticSource {
    pub fn returning(supplement: Record) -> Arc<Self> {
        Arc::new(Self {
            supplement: Some(supplement),
            calls: Mutex::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            supplement: None,
            calls: Mutex::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl SupplementalSource for StaticSource {
    async fn get_supplemental_fields(&self, _record: &Record) -> Result<Record> {
        *self.calls.lock().unwrap() += 1;
        self.supplement
            .clone()
            .ok_or_else(|| Error::augmentation("archive unavailable"))
    }
}

/// Worker settings with a short retry wait
pub fn create_test_config() -> WorkerConfig {
    WorkerConfig::new(ApiKey::new(TEST_API_KEY).unwrap())
        .with_retry(3, Duration::from_secs(5))
        .with_timeout(Duration::from_secs(2))
}

/// Worker over the default layout with a recording observer
pub fn create_worker(
    config: WorkerConfig,
    transport: Arc<ScriptedTransport>,
) -> (UploadWorker, Arc<RecordingObserver>) {
    let observer = Arc::new(RecordingObserver::default());
    let worker = UploadWorker::new(
        config,
        FieldMap::default_layout(),
        transport,
        Arc::new(StandardUnits::new()),
    )
    .unwrap()
    .with_observer(observer.clone());
    (worker, observer)
}
