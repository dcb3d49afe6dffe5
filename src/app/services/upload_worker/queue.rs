//! Producer-side queue handle

use crate::app::models::{Record, UploadTask};
use crate::{Error, Result};
use tokio::sync::mpsc;

/// Cloneable handle the producer uses to feed the worker
///
/// Enqueueing never blocks and never waits on the network. The channel is
/// unbounded; the worker's backlog limit is the only cap.
#[derive(Debug, Clone)]
pub struct UploadQueue {
    sender: mpsc::UnboundedSender<UploadTask>,
}

impl UploadQueue {
    /// Create a queue and the receiving end for the worker
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<UploadTask>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Hand a record to the worker
    ///
    /// # Returns
    ///
    /// `Error::QueueClosed` once the worker has stopped
    pub fn enqueue(&self, record: Record) -> Result<()> {
        self.sender
            .send(UploadTask::Record(record))
            .map_err(|_| Error::QueueClosed)
    }

    /// Ask the worker to stop after the records already queued
    pub fn shutdown(&self) -> Result<()> {
        self.sender
            .send(UploadTask::Shutdown)
            .map_err(|_| Error::QueueClosed)
    }

    /// Whether the worker has gone away
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
