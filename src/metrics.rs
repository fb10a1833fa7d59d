use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Counters for the media page and the aggregation pipeline
#[derive(Clone)]
pub struct Metrics {
    pub pages_rendered: Arc<AtomicUsize>,
    pub aggregation_passes: Arc<AtomicUsize>,
    pub jobs_succeeded: Arc<AtomicUsize>,
    pub jobs_failed: Arc<AtomicUsize>,
    pub dirs_visited: Arc<AtomicU64>,
    pub dirs_skipped: Arc<AtomicU64>,
    pub unreadable_dirs: Arc<AtomicU64>,
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            pages_rendered: Arc::new(AtomicUsize::new(0)),
            aggregation_passes: Arc::new(AtomicUsize::new(0)),
            jobs_succeeded: Arc::new(AtomicUsize::new(0)),
            jobs_failed: Arc::new(AtomicUsize::new(0)),
            dirs_visited: Arc::new(AtomicU64::new(0)),
            dirs_skipped: Arc::new(AtomicU64::new(0)),
            unreadable_dirs: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn inc_pages_rendered(&self) {
        self.pages_rendered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_aggregation_passes(&self) {
        self.aggregation_passes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_jobs_succeeded(&self) {
        self.jobs_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_jobs_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dirs_visited(&self) {
        self.dirs_visited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dirs_skipped(&self) {
        self.dirs_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_unreadable_dirs(&self) {
        self.unreadable_dirs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pages_rendered: self.pages_rendered.load(Ordering::Relaxed),
            aggregation_passes: self.aggregation_passes.load(Ordering::Relaxed),
            jobs_succeeded: self.jobs_succeeded.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
            dirs_visited: self.dirs_visited.load(Ordering::Relaxed),
            dirs_skipped: self.dirs_skipped.load(Ordering::Relaxed),
            unreadable_dirs: self.unreadable_dirs.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub pages_rendered: usize,
    pub aggregation_passes: usize,
    pub jobs_succeeded: usize,
    pub jobs_failed: usize,
    pub dirs_visited: u64,
    pub dirs_skipped: u64,
    pub unreadable_dirs: u64,
    pub uptime_seconds: u64,
}
