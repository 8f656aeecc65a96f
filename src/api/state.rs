use std::sync::Arc;

use crate::engine::LifecycleEngine;
use crate::metrics::Metrics;
use crate::utils::RetryConfig;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<LifecycleEngine>,
    pub metrics: Arc<Metrics>,
    /// Backoff for operations that hit a concurrency conflict
    pub retry: RetryConfig,
}
