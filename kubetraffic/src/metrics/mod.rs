//! Prometheus counters and the `/metrics` endpoint.
//!
//! Pipelines only see the `MetricSink` trait; the concrete counters live in
//! [`registry::Metrics`], which is built once in `main` and shared.

pub mod registry;
pub mod server;

use prometheus::IntCounterVec;

pub use registry::{Metrics, Outcome};

/// A counter family keyed by an ordered tuple of label values.
///
/// Incrementing an unseen tuple creates its counter. Implementations must
/// tolerate concurrent increments from both pipelines.
pub trait MetricSink: Send + Sync {
    fn increment(&self, labels: &[&str]);
}

impl MetricSink for IntCounterVec {
    fn increment(&self, labels: &[&str]) {
        match self.get_metric_with_label_values(labels) {
            Ok(counter) => counter.inc(),
            Err(e) => log::error!("dropping increment for labels {labels:?}: {e}"),
        }
    }
}
