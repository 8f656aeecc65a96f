// Private module declaration
mod server;

use prometheus::{
    HistogramOpts, HistogramTimer, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
};

// Re-export for public API
pub use server::{health_handler, metrics_handler};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Order creation by payment method
// - Accepted lifecycle transitions on both axes
// - Rejected operations by error kind
// - Operation latency
// - Caller-side retry attempts and outcomes
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // Lifecycle Metrics
    pub orders_created: IntCounterVec,
    pub lifecycle_transitions: IntCounterVec,
    pub operations_rejected: IntCounterVec,
    pub stock_reservation_failures: IntCounter,
    pub operation_duration: HistogramVec,

    // Retry Metrics
    pub retry_attempts_total: IntCounterVec,
    pub retry_outcomes: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Lifecycle Metrics
        let orders_created = IntCounterVec::new(
            Opts::new("orders_created_total", "Total orders created"),
            &["payment_method"],
        )?;
        registry.register(Box::new(orders_created.clone()))?;

        let lifecycle_transitions = IntCounterVec::new(
            Opts::new("lifecycle_transitions_total", "Accepted order and credit transitions"),
            &["domain", "from", "to"],
        )?;
        registry.register(Box::new(lifecycle_transitions.clone()))?;

        let operations_rejected = IntCounterVec::new(
            Opts::new("operations_rejected_total", "Operations rejected by the engine"),
            &["operation", "kind"],
        )?;
        registry.register(Box::new(operations_rejected.clone()))?;

        let stock_reservation_failures = IntCounter::new(
            "stock_reservation_failures_total",
            "Order placements refused for insufficient stock",
        )?;
        registry.register(Box::new(stock_reservation_failures.clone()))?;

        let operation_duration = HistogramVec::new(
            HistogramOpts::new("operation_duration_seconds", "Engine operation duration")
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["operation"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        // Retry Metrics
        let retry_attempts_total = IntCounterVec::new(
            Opts::new("retry_attempts_total", "Total retry attempts"),
            &["operation", "attempt"],
        )?;
        registry.register(Box::new(retry_attempts_total.clone()))?;

        let retry_outcomes = IntCounterVec::new(
            Opts::new("retry_outcomes_total", "Final outcome of retried operations"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(retry_outcomes.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            lifecycle_transitions,
            operations_rejected,
            stock_reservation_failures,
            operation_duration,
            retry_attempts_total,
            retry_outcomes,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_order_created(&self, payment_method: &str) {
        self.orders_created.with_label_values(&[payment_method]).inc();
    }

    /// Helper to record an accepted transition (`from` is "none" for the first entry of an axis)
    pub fn record_transition(&self, domain: &str, from: &str, to: &str) {
        self.lifecycle_transitions.with_label_values(&[domain, from, to]).inc();
    }

    pub fn record_rejection(&self, operation: &str, kind: &str) {
        self.operations_rejected.with_label_values(&[operation, kind]).inc();
    }

    pub fn record_stock_failure(&self) {
        self.stock_reservation_failures.inc();
    }

    /// Observes the elapsed time when the returned timer is dropped
    pub fn start_timer(&self, operation: &str) -> HistogramTimer {
        self.operation_duration.with_label_values(&[operation]).start_timer()
    }

    /// Helper to record retry attempt
    pub fn record_retry_attempt(&self, operation: &str, attempt: u32) {
        self.retry_attempts_total.with_label_values(&[operation, &attempt.to_string()]).inc();
    }

    /// Helper to record retry outcome
    pub fn record_retry_outcome(&self, operation: &str, outcome: &str) {
        self.retry_outcomes.with_label_values(&[operation, outcome]).inc();
    }
}
