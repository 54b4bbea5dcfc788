use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::info;

use super::{services, state::AppState};
use crate::config::Config;
use crate::engine;
use crate::media::MediaStore;
use crate::observability::Metrics;
use crate::queue;
use crate::task::TaskStore;
use crate::worker::WorkerPool;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Assemble the HTTP surface. Result images are served straight off the
/// results directory.
pub fn router(state: AppState) -> Router {
    let results_dir = state.config.media.results_dir.clone();

    Router::new()
        .route("/", get(services::welcome))
        .route("/upload_image", post(services::upload_image))
        .route("/result/{id}", get(services::swap_result))
        .nest_service("/media_result", ServeDir::new(results_dir))
        .with_state(state)
}

/// Composition root: config, store, media, queue, recovery, worker pool,
/// then the listener. Recovery runs to completion before any worker or
/// request handler can observe the queue.
pub async fn run(address: Option<SocketAddr>) -> Result<(), AnyError> {
    info!("Loading configuration");
    let config = Config::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let address = address.unwrap_or(config.server.bind_addr);

    let store = TaskStore::open(&config.store.path)
        .map_err(|e| format!("Failed to open task store: {e}"))?;
    let media = MediaStore::open(
        &config.media.upload_dir,
        &config.media.results_dir,
        config.media.public_url.clone(),
    )
    .map_err(|e| format!("Failed to open media storage: {e}"))?;

    let (task_queue, receiver) = queue::bounded(config.queue.capacity);

    let requeued = queue::seed_queue(&store, &task_queue)?;
    if requeued > 0 {
        info!(requeued, "Re-enqueued unfinished swap tasks");
    }

    let metrics = Arc::new(Metrics::new());
    let factory = engine::command_factory(config.engine.command.clone());
    let pool = WorkerPool::spawn(
        config.pool.workers,
        &config.engine.device,
        &receiver,
        &store,
        &media,
        &metrics,
        &factory,
    )?;

    let state = AppState::new(config, store, media, task_queue, metrics);
    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, workers = pool.size(), "Faceswap API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
