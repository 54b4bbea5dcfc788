//! Startup recovery: re-enqueue work that was submitted but never finished.
//!
//! Runs once, before the worker pool starts and before the listener binds.
//! Re-enqueueing a pending task is always safe, so recovery is idempotent.

use tracing::{info, warn};

use super::channel::{QueueError, TaskQueue};
use crate::task::{StoreError, TaskStore};

/// Scan the store for pending tasks (insertion order, capped at queue
/// capacity) and seed the work queue with their ids.
///
/// Returns the number of tasks requeued.
pub fn seed_queue(store: &TaskStore, queue: &TaskQueue) -> Result<usize, StoreError> {
    let pending = store.pending_ids(queue.capacity())?;

    let mut requeued = 0;
    for id in pending {
        match queue.enqueue(id) {
            Ok(()) => requeued += 1,
            Err(QueueError::Full(capacity)) => {
                // Capacity-capped scan means this only happens when something
                // else filled the queue first; the rest stays pending and is
                // picked up on the next restart.
                warn!(requeued, capacity, "Queue filled during recovery");
                break;
            }
            Err(QueueError::Closed) => break,
        }
    }

    info!(requeued, "Recovery pass complete");
    Ok(requeued)
}
