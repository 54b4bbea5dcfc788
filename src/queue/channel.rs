//! Bounded FIFO work queue carrying task ids from the API to the worker pool.
//!
//! The queue carries identifiers only, never task payloads: ids are cheap to
//! requeue and tolerant of duplication, while payloads are not. A single
//! receiver is shared by every worker, so FIFO order is global and each id is
//! delivered to exactly one worker.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use crate::task::TaskId;

#[derive(Debug, Error)]
pub enum QueueError {
    /// The queue is at capacity. Submissions must be rejected, never
    /// silently dropped and never blocked on.
    #[error("work queue is at capacity ({0})")]
    Full(usize),

    #[error("work queue is closed")]
    Closed,
}

/// Producer side. Held by the submission API and the recovery loader.
#[derive(Clone)]
pub struct TaskQueue {
    tx: mpsc::Sender<TaskId>,
    capacity: usize,
}

/// Consumer side, shared across the whole worker pool.
#[derive(Clone)]
pub struct TaskReceiver {
    rx: Arc<Mutex<mpsc::Receiver<TaskId>>>,
}

/// Create a bounded queue with the given capacity.
pub fn bounded(capacity: usize) -> (TaskQueue, TaskReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        TaskQueue { tx, capacity },
        TaskReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

impl TaskQueue {
    /// Enqueue a task id, failing immediately if the queue is full.
    pub fn enqueue(&self, id: TaskId) -> Result<(), QueueError> {
        match self.tx.try_send(id) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(id)) => {
                debug!(%id, capacity = self.capacity, "Queue full, rejecting");
                Err(QueueError::Full(self.capacity))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(QueueError::Closed),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl TaskReceiver {
    /// Wait for the next task id. Returns `None` only after every producer
    /// handle has been dropped and the queue drained.
    ///
    /// Workers hold the receiver lock only for the duration of one `recv`,
    /// never across task processing, so one slow inference does not starve
    /// the rest of the pool.
    pub async fn dequeue(&self) -> Option<TaskId> {
        self.rx.lock().await.recv().await
    }
}
