//! Observability stubs (metrics, tracing)

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    tasks_submitted: AtomicU64,
    tasks_rejected: AtomicU64,
    swaps_completed: AtomicU64,
    faces_not_found: AtomicU64,
    tasks_abandoned: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task_submitted(&self) {
        self.tasks_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_rejected(&self) {
        self.tasks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn swap_completed(&self) {
        self.swaps_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn faces_not_found(&self) {
        self.faces_not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_abandoned(&self) {
        self.tasks_abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tasks_submitted: self.tasks_submitted.load(Ordering::Relaxed),
            tasks_rejected: self.tasks_rejected.load(Ordering::Relaxed),
            swaps_completed: self.swaps_completed.load(Ordering::Relaxed),
            faces_not_found: self.faces_not_found.load(Ordering::Relaxed),
            tasks_abandoned: self.tasks_abandoned.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub tasks_submitted: u64,
    pub tasks_rejected: u64,
    pub swaps_completed: u64,
    pub faces_not_found: u64,
    pub tasks_abandoned: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = Metrics::new();
        metrics.task_submitted();
        metrics.task_submitted();
        metrics.task_rejected();

        let snap = metrics.snapshot();
        assert_eq!(snap.tasks_submitted, 2);
        assert_eq!(snap.tasks_rejected, 1);
        assert_eq!(snap.swaps_completed, 0);
    }
}
