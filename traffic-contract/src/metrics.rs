//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `contract_invocations_total` - Invocations by operation name
//! - `contract_denials_total` - Authorization denials
//! - `contract_records_written_total` - Records staged for commit

use crate::policy::Operation;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Invocations by operation
    pub invocations_total: IntCounterVec,

    /// Authorization denials
    pub denials_total: IntCounter,

    /// Records staged for commit
    pub records_written_total: IntCounter,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let invocations_total = IntCounterVec::new(
            Opts::new("contract_invocations_total", "Invocations by operation"),
            &["operation"],
        )?;
        registry.register(Box::new(invocations_total.clone()))?;

        let denials_total = IntCounter::with_opts(Opts::new(
            "contract_denials_total",
            "Authorization denials",
        ))?;
        registry.register(Box::new(denials_total.clone()))?;

        let records_written_total = IntCounter::with_opts(Opts::new(
            "contract_records_written_total",
            "Records staged for commit",
        ))?;
        registry.register(Box::new(records_written_total.clone()))?;

        Ok(Self {
            invocations_total,
            denials_total,
            records_written_total,
            registry,
        })
    }

    /// Record one invocation of an operation
    pub fn record_invocation(&self, operation: Operation) {
        self.invocations_total
            .with_label_values(&[operation.name()])
            .inc();
    }

    /// Record an authorization denial
    pub fn record_denial(&self) {
        self.denials_total.inc();
    }

    /// Record a staged record write
    pub fn record_write(&self) {
        self.records_written_total.inc();
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
