//! Inference worker: claims task ids off the queue and runs them to a
//! terminal state.
//!
//! A worker is built as a cheap shell and armed by `initialize()`, which
//! constructs its private engine exactly once. The serve loop then never
//! re-initializes: dequeue, fetch the record, load both images, infer,
//! persist one atomic outcome. Failures along the way are logged and the item
//! is abandoned — the task stays pending and the worker moves on.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::engine::{EngineError, EngineFactory, InferenceEngine};
use crate::media::MediaStore;
use crate::observability::Metrics;
use crate::queue::TaskReceiver;
use crate::task::{SwapReport, TaskStore};

pub struct InferenceWorker {
    id: usize,
    device: String,
    receiver: TaskReceiver,
    store: TaskStore,
    media: MediaStore,
    metrics: Arc<Metrics>,
    factory: EngineFactory,
    engine: Option<Box<dyn InferenceEngine>>,
}

impl InferenceWorker {
    /// Build the shell. No engine is constructed here; that happens in
    /// [`initialize`](Self::initialize) on the worker's own thread.
    pub fn new(
        id: usize,
        device: &str,
        receiver: TaskReceiver,
        store: TaskStore,
        media: MediaStore,
        metrics: Arc<Metrics>,
        factory: EngineFactory,
    ) -> Self {
        Self {
            id,
            device: device.to_string(),
            receiver,
            store,
            media,
            metrics,
            factory,
            engine: None,
        }
    }

    /// Construct the private engine instance. Idempotent: a second call on an
    /// armed worker is a no-op.
    pub fn initialize(&mut self) -> Result<(), EngineError> {
        if self.engine.is_some() {
            return Ok(());
        }
        self.engine = Some((self.factory)(&self.device)?);
        Ok(())
    }

    /// Serve loop. Returns only when the queue is closed or engine
    /// initialization fails; the pool does not restart exited workers.
    pub async fn run(mut self) {
        if let Err(e) = self.initialize() {
            error!(worker = self.id, error = %e, "Engine initialization failed, worker exiting");
            return;
        }
        info!(worker = self.id, device = %self.device, "Worker ready");

        while let Some(id) = self.receiver.dequeue().await {
            self.process(&id).await;
        }

        info!(worker = self.id, "Queue closed, worker exiting");
    }

    /// Run one claimed task to completion. Never panics on bad input; every
    /// failure path logs and returns, leaving the record as it was.
    pub async fn process(&mut self, id: &str) {
        let task = match self.store.get(id) {
            Ok(Some(task)) => task,
            Ok(None) => {
                // Benign race: the record was deleted between enqueue and claim.
                warn!(worker = self.id, %id, "Task record missing, skipping");
                return;
            }
            Err(e) => {
                error!(worker = self.id, %id, error = %e, "Failed to fetch task");
                self.metrics.task_abandoned();
                return;
            }
        };

        let Ok(source) = self.media.load_upload(&task.source_path).await else {
            warn!(worker = self.id, %id, path = %task.source_path, "Source image unreadable, abandoning");
            self.metrics.task_abandoned();
            return;
        };
        let Ok(target) = self.media.load_upload(&task.target_path).await else {
            warn!(worker = self.id, %id, path = %task.target_path, "Target image unreadable, abandoning");
            self.metrics.task_abandoned();
            return;
        };

        let outcome = {
            let Some(engine) = self.engine.as_mut() else {
                error!(worker = self.id, %id, "Worker not initialized");
                return;
            };
            match engine.swap_faces(&source, &target) {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(worker = self.id, %id, error = %e, "Inference failed, abandoning");
                    self.metrics.task_abandoned();
                    return;
                }
            }
        };

        let report = if outcome.source_face && outcome.target_face {
            let Some(image) = outcome.image else {
                error!(worker = self.id, %id, "Engine returned no image for a found pair, abandoning");
                self.metrics.task_abandoned();
                return;
            };
            // The image must be durable before the record advertises it.
            match self.media.save_result(id, image).await {
                Ok(result_key) => SwapReport::done(result_key),
                Err(e) => {
                    error!(worker = self.id, %id, error = %e, "Failed to store result image, abandoning");
                    self.metrics.task_abandoned();
                    return;
                }
            }
        } else {
            SwapReport::faces_not_found(outcome.source_face, outcome.target_face)
        };

        let faces_found = report.source_face && report.target_face;
        if let Err(e) = self.store.complete(id, report) {
            error!(worker = self.id, %id, error = %e, "Failed to persist outcome");
            self.metrics.task_abandoned();
            return;
        }

        if faces_found {
            self.metrics.swap_completed();
        } else {
            self.metrics.faces_not_found();
        }
        info!(worker = self.id, %id, "Inference done");
    }
}
