use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::aggregator::{Aggregator, AggregatorSettings};
use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::playlist::PlaylistRenderer;

/// The shared application state.
///
/// Cloned into every request. Holds no directory data: the served tree is
/// re-read on every request.
#[derive(Clone)]
pub struct AppState {
    /// The directory being served. All produced tracks land here.
    pub root: Arc<PathBuf>,
    /// The application configuration.
    pub config: Arc<AppConfig>,
    /// The aggregation pipeline; `None` when the feature is disabled.
    pub aggregator: Option<Aggregator>,
    pub renderer: PlaylistRenderer,
    pub metrics: Metrics,
}

impl AppState {
    /// Creates the state for `root`. The aggregator is only built when
    /// `config.aggregator.enabled` is set; it stops starting new work once
    /// `cancel` fires.
    pub fn new(root: PathBuf, config: AppConfig, cancel: CancellationToken) -> Self {
        let metrics = Metrics::new();
        let aggregator = config.aggregator.enabled.then(|| {
            let settings = AggregatorSettings::from_config(&config.aggregator);
            Aggregator::new(root.clone(), &settings, metrics.clone(), cancel)
        });

        Self {
            root: Arc::new(root),
            config: Arc::new(config),
            aggregator,
            renderer: PlaylistRenderer::new(),
            metrics,
        }
    }

    /// Replaces the aggregator, e.g. with one using a different runner.
    pub fn with_aggregator(mut self, aggregator: Option<Aggregator>) -> Self {
        self.aggregator = aggregator;
        self
    }
}
