//! Per-task progress channel and cancellation signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use autofill_core_types::{ProgressSink, TaskId};
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::model::TaskRecord;

/// Writer half of a task's progress stream.
///
/// Sends never block: a full buffer drops the line. The sender lives behind a
/// mutex so that closing (taking it) happens exactly once, whichever of the
/// execution wrapper or a cancel request gets there first.
pub struct ProgressChannel {
    task_id: TaskId,
    record: Arc<Mutex<TaskRecord>>,
    sender: Mutex<Option<mpsc::Sender<String>>>,
}

impl ProgressChannel {
    pub fn new(
        task_id: TaskId,
        record: Arc<Mutex<TaskRecord>>,
        capacity: usize,
    ) -> (Self, ProgressReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let channel = Self {
            task_id,
            record,
            sender: Mutex::new(Some(tx)),
        };
        (channel, ProgressReceiver::new(rx))
    }

    pub fn send(&self, message: &str) {
        self.record.lock().set_progress(message);
        let sender = self.sender.lock();
        if let Some(tx) = sender.as_ref() {
            deliver(&self.task_id, tx, message);
        }
    }

    /// Sends an optional last line, then closes. Returns false if already closed.
    pub fn close_with(&self, last: Option<&str>) -> bool {
        let mut sender = self.sender.lock();
        let Some(tx) = sender.take() else {
            return false;
        };
        if let Some(message) = last {
            deliver(&self.task_id, &tx, message);
        }
        debug!(task_id = %self.task_id, "progress channel closed");
        true
    }

    pub fn close(&self) -> bool {
        self.close_with(None)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }
}

fn deliver(task_id: &TaskId, tx: &mpsc::Sender<String>, message: &str) {
    match tx.try_send(message.to_string()) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            debug!(task_id = %task_id, "progress channel full, line dropped");
        }
        Err(TrySendError::Closed(_)) => {
            debug!(task_id = %task_id, "progress reader gone, line dropped");
        }
    }
}

impl ProgressSink for ProgressChannel {
    fn emit(&self, message: &str) {
        self.send(message);
    }
}

/// Reader half. Clones share the same underlying receiver, so there is still
/// one logical reader; `recv` yields `None` once the channel is closed and drained.
#[derive(Clone)]
pub struct ProgressReceiver {
    inner: Arc<tokio::sync::Mutex<mpsc::Receiver<String>>>,
}

impl ProgressReceiver {
    fn new(rx: mpsc::Receiver<String>) -> Self {
        Self {
            inner: Arc::new(tokio::sync::Mutex::new(rx)),
        }
    }

    pub async fn recv(&self) -> Option<String> {
        self.inner.lock().await.recv().await
    }
}

/// One-shot cancellation broadcast that can be fired from several places.
#[derive(Debug, Default)]
pub struct CancelSignal {
    fired: AtomicBool,
    token: CancellationToken,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the signal. Only the first call returns true.
    pub fn fire(&self) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.token.cancel();
        true
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}
