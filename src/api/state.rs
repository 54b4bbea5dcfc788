use std::sync::Arc;

use crate::config::Config;
use crate::media::MediaStore;
use crate::observability::Metrics;
use crate::queue::TaskQueue;
use crate::task::TaskStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<TaskStore>,
    pub media: Arc<MediaStore>,
    pub queue: TaskQueue,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: TaskStore,
        media: MediaStore,
        queue: TaskQueue,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            media: Arc::new(media),
            queue,
            metrics,
        }
    }
}
