//! Recursive per-directory audio concatenation.
//!
//! Every directory `D` below the served root is turned into one track,
//! `<served root>/<basename(D)>.mp3`, made of the audio files that are direct
//! children of `D`. Subdirectories are processed first, one task each, and the
//! parent waits for all of them before it runs its own job.
//!
//! The existence of the output file is the only record of a finished job. A
//! subdirectory whose output exists is neither descended into nor re-encoded,
//! which keeps repeated page requests from re-emitting tracks.

mod ffmpeg;
mod locks;

pub use ffmpeg::{concat_args, ConcatError, ConcatRunner, FfmpegRunner, OUTPUT_BITRATE, OUTPUT_CODEC};
pub use locks::{JobGuard, JobLocks};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use crate::config::AggregatorConfig;
use crate::media::{classify, MediaKind};
use crate::metrics::Metrics;
use crate::types::{read_entries, DirectoryEntry};

/// Extension of every produced track.
pub const OUTPUT_EXTENSION: &str = "mp3";

#[derive(Debug, Clone)]
pub struct AggregatorSettings {
    pub ffmpeg_path: String,
    pub max_concurrent_jobs: usize,
    pub job_timeout: Option<Duration>,
}

impl AggregatorSettings {
    pub fn from_config(cfg: &AggregatorConfig) -> Self {
        // Standard: so viele ffmpeg-Prozesse wie CPU-Kerne
        let max_jobs = cfg.max_concurrent_jobs.unwrap_or_else(num_cpus::get).max(1);
        Self {
            ffmpeg_path: cfg.ffmpeg_path.clone(),
            max_concurrent_jobs: max_jobs,
            job_timeout: cfg.job_timeout_secs.map(Duration::from_secs),
        }
    }
}

struct Inner {
    root: PathBuf,
    runner: Arc<dyn ConcatRunner>,
    permits: Semaphore,
    locks: JobLocks,
    cancel: CancellationToken,
    metrics: Metrics,
}

/// Handle to the aggregation pipeline of one served root. Cheap to clone.
#[derive(Clone)]
pub struct Aggregator {
    inner: Arc<Inner>,
}

impl Aggregator {
    /// Creates an aggregator that spawns the configured ffmpeg binary.
    pub fn new(root: PathBuf, settings: &AggregatorSettings, metrics: Metrics, cancel: CancellationToken) -> Self {
        let runner = FfmpegRunner::new(settings.ffmpeg_path.clone(), settings.job_timeout);
        Self::with_runner(root, Arc::new(runner), settings.max_concurrent_jobs, metrics, cancel)
    }

    pub fn with_runner(
        root: PathBuf,
        runner: Arc<dyn ConcatRunner>,
        max_concurrent_jobs: usize,
        metrics: Metrics,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                root,
                runner,
                permits: Semaphore::new(max_concurrent_jobs.max(1)),
                locks: JobLocks::new(),
                cancel,
                metrics,
            }),
        }
    }

    pub fn locks(&self) -> &JobLocks {
        &self.inner.locks
    }

    /// Output track for `dir`, or `None` if `dir` has no final component.
    pub fn output_path(&self, dir: &Path) -> Option<PathBuf> {
        let name = dir.file_name()?;
        let mut file = name.to_os_string();
        file.push(".");
        file.push(OUTPUT_EXTENSION);
        Some(self.inner.root.join(file))
    }

    /// Whether the output track of `dir` already exists as a regular file.
    pub async fn is_concatenated(&self, dir: &Path) -> bool {
        match self.output_path(dir) {
            Some(out) => is_file(&out).await,
            None => false,
        }
    }

    /// The pass run for every media page request: aggregates each direct
    /// subdirectory of the served root that has no track yet. The root's own
    /// files are left alone.
    pub async fn aggregate_root(&self) {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("aggregate", %run_id);
        async {
            self.inner.metrics.inc_aggregation_passes();
            let started = Instant::now();
            let root = self.inner.root.clone();
            let entries = match read_entries(&root).await {
                Ok(e) => e,
                Err(e) => {
                    self.inner.metrics.inc_unreadable_dirs();
                    error!("could not open directory '{}': {}", root.display(), e);
                    return;
                }
            };
            self.fan_out(&entries).await;
            info!(elapsed_ms = started.elapsed().as_millis() as u64, "aggregation pass finished");
        }
        .instrument(span)
        .await
    }

    /// Aggregates `dir` and, first, every subdirectory below it.
    ///
    /// Boxed so the recursion can be spawned as independent tasks.
    pub fn aggregate(&self, dir: PathBuf) -> BoxFuture<'static, ()> {
        let this = self.clone();
        async move { this.aggregate_level(dir).await }.boxed()
    }

    async fn aggregate_level(&self, dir: PathBuf) {
        if self.inner.cancel.is_cancelled() {
            debug!("cancelled before '{}'", dir.display());
            return;
        }
        let Some(output) = self.output_path(&dir) else {
            warn!("cannot derive a track name for '{}'", dir.display());
            return;
        };
        self.inner.metrics.inc_dirs_visited();

        let entries = match read_entries(&dir).await {
            Ok(e) => e,
            Err(e) => {
                self.inner.metrics.inc_unreadable_dirs();
                error!("could not open directory '{}': {}", dir.display(), e);
                return;
            }
        };

        let spawned = self.fan_out(&entries).await;

        // Children write into the served root; re-list it so their tracks count as inputs here
        let entries = if spawned > 0 && dir == self.inner.root {
            match read_entries(&dir).await {
                Ok(e) => e,
                Err(e) => {
                    self.inner.metrics.inc_unreadable_dirs();
                    error!("could not re-open directory '{}': {}", dir.display(), e);
                    return;
                }
            }
        } else {
            entries
        };

        let inputs = audio_inputs(&entries, &output);
        if inputs.is_empty() {
            debug!("no audio in '{}'", dir.display());
            return;
        }
        self.run_job(&dir, inputs, output).await;
    }

    /// Spawns one task per subdirectory without a track and waits for all of
    /// them. Returns how many were spawned.
    async fn fan_out(&self, entries: &[DirectoryEntry]) -> usize {
        let mut set = JoinSet::new();
        for sub in entries.iter().filter(|e| e.is_dir) {
            if self.inner.cancel.is_cancelled() {
                break;
            }
            if self.is_concatenated(&sub.path).await {
                self.inner.metrics.inc_dirs_skipped();
                debug!("skipping '{}': already concatenated", sub.path.display());
                continue;
            }
            set.spawn(self.aggregate(sub.path.clone()).in_current_span());
        }
        let spawned = set.len();

        // Barrier: the level's own job only runs after every child finished
        while let Some(res) = set.join_next().await {
            if let Err(e) = res {
                error!("aggregation task failed: {}", e);
            }
        }
        spawned
    }

    async fn run_job(&self, dir: &Path, inputs: Vec<PathBuf>, output: PathBuf) {
        let _guard = self.inner.locks.acquire(&output).await;
        // A concurrent pass may have produced the track while we waited
        if is_file(&output).await {
            self.inner.metrics.inc_dirs_skipped();
            debug!("'{}' appeared while waiting, skipping", output.display());
            return;
        }
        let _permit = match self.inner.permits.acquire().await {
            Ok(p) => p,
            Err(_) => return,
        };

        info!("concatenating {} file(s) of '{}' into '{}'", inputs.len(), dir.display(), output.display());
        match self.inner.runner.concat(&inputs, &output, &self.inner.cancel).await {
            Ok(()) => {
                self.inner.metrics.inc_jobs_succeeded();
                info!("wrote '{}'", output.display());
            }
            Err(e) => {
                self.inner.metrics.inc_jobs_failed();
                error!("concat of '{}' failed: {}", dir.display(), e);
                if let Err(rm) = tokio::fs::remove_file(&output).await {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        warn!("could not remove partial output '{}': {}", output.display(), rm);
                    }
                }
            }
        }
    }
}

/// Audio files among `entries`, in listing order, never including `output` itself.
fn audio_inputs(entries: &[DirectoryEntry], output: &Path) -> Vec<PathBuf> {
    entries
        .iter()
        .filter(|e| !e.is_dir && e.path != output)
        .filter(|e| {
            let audio = classify(&e.name) == MediaKind::Audio;
            if !audio {
                debug!("skipping file '{}'", e.name);
            }
            audio
        })
        .map(|e| e.path.clone())
        .collect()
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}
