//! Integration tests across modules.
//!
//! ## Test Modules
//!
//! - **aggregator_tests**: recursive concatenation against a recording runner
//! - **api_tests**: media page, file tree, health and metrics over the router
//! - **config_tests**: configuration loading and validation
//! - **error_tests**: error responses

pub mod aggregator_tests;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::aggregator::{Aggregator, ConcatError, ConcatRunner};
use crate::metrics::Metrics;

/// A `ConcatRunner` that records every job and writes a small placeholder
/// track instead of spawning ffmpeg.
#[derive(Default)]
pub(crate) struct RecordingRunner {
    calls: Mutex<Vec<(Vec<PathBuf>, PathBuf)>>,
    fail: bool,
    delay: Option<Duration>,
    running: AtomicUsize,
    max_running: AtomicUsize,
}

impl RecordingRunner {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn failing() -> Arc<Self> {
        Arc::new(Self { fail: true, ..Self::default() })
    }

    pub(crate) fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self { delay: Some(delay), ..Self::default() })
    }

    pub(crate) fn calls(&self) -> Vec<(Vec<PathBuf>, PathBuf)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn max_running(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConcatRunner for RecordingRunner {
    async fn concat(&self, inputs: &[PathBuf], output: &Path, _cancel: &CancellationToken) -> Result<(), ConcatError> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push((inputs.to_vec(), output.to_path_buf()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        // Simulates ffmpeg writing before it dies
        std::fs::write(output, if self.fail { &b"partial"[..] } else { &b"ID3"[..] }).unwrap();
        self.running.fetch_sub(1, Ordering::SeqCst);

        if self.fail {
            Err(ConcatError::TimedOut(Duration::from_secs(1)))
        } else {
            Ok(())
        }
    }
}

pub(crate) fn aggregator_with(root: &Path, runner: Arc<RecordingRunner>, max_jobs: usize) -> (Aggregator, Metrics) {
    let metrics = Metrics::new();
    let agg = Aggregator::with_runner(root.to_path_buf(), runner, max_jobs, metrics.clone(), CancellationToken::new());
    (agg, metrics)
}

/// Names of `dir`'s children in the order the filesystem lists them.
pub(crate) fn listing_order(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect()
}
