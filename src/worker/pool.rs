//! Fixed pool of inference workers.
//!
//! Each worker gets a dedicated, named OS thread with a private
//! current-thread runtime: inference blocks for seconds at a time and must
//! never run on the API's event loop. Workers share nothing but the queue
//! receiver and the store; there is no load balancing beyond the FIFO itself
//! and no supervision — a worker that exits is not replaced.

use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{error, info};

use super::runner::InferenceWorker;
use crate::engine::EngineFactory;
use crate::media::MediaStore;
use crate::observability::Metrics;
use crate::queue::TaskReceiver;
use crate::task::TaskStore;

pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start `count` workers. Each receives its own clones of the shared
    /// handles; the engine itself is constructed lazily on the worker thread
    /// via `factory`.
    pub fn spawn(
        count: usize,
        device: &str,
        receiver: &TaskReceiver,
        store: &TaskStore,
        media: &MediaStore,
        metrics: &Arc<Metrics>,
        factory: &EngineFactory,
    ) -> std::io::Result<Self> {
        let mut handles = Vec::with_capacity(count);

        for id in 0..count {
            let worker = InferenceWorker::new(
                id,
                device,
                receiver.clone(),
                store.clone(),
                media.clone(),
                Arc::clone(metrics),
                Arc::clone(factory),
            );

            let handle = std::thread::Builder::new()
                .name(format!("inference-worker-{id}"))
                .spawn(move || {
                    let runtime = match tokio::runtime::Builder::new_current_thread()
                        .enable_all()
                        .build()
                    {
                        Ok(runtime) => runtime,
                        Err(e) => {
                            error!(worker = id, error = %e, "Failed to build worker runtime");
                            return;
                        }
                    };
                    runtime.block_on(worker.run());
                })?;
            handles.push(handle);
        }

        info!(workers = handles.len(), "Inference workers started");
        Ok(Self { handles })
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Wait for every worker to exit. Workers only exit once all queue
    /// producers are gone, so this is a shutdown/test affordance.
    pub fn join(self) {
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}
