use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::time::Instant;

use super::summary::{endpoint_metrics, summarize};
use super::{EndpointGroup, EndpointMetrics, RequestMetric, SummaryMetrics};

/// Process-wide sink for request metrics, shared behind an `Arc`.
///
/// The lock is only taken for short synchronous sections and never across an
/// `.await`.
#[derive(Debug)]
pub struct MetricsCollector {
    state: Mutex<CollectorState>,
}

#[derive(Debug)]
struct CollectorState {
    metrics: Vec<RequestMetric>,
    started: Instant,
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CollectorState {
                metrics: Vec::new(),
                started: Instant::now(),
            }),
        }
    }

    pub fn record(&self, metric: RequestMetric) {
        self.lock().metrics.push(metric);
    }

    /// Drops every metric and restarts the elapsed-time clock.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.metrics.clear();
        state.started = Instant::now();
    }

    /// A snapshot of every metric in recording order.
    #[must_use]
    pub fn metrics(&self) -> Vec<RequestMetric> {
        self.lock().metrics.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().metrics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().metrics.is_empty()
    }

    #[must_use]
    pub fn summary(&self) -> SummaryMetrics {
        let state = self.lock();
        let elapsed_ms = u64::try_from(state.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        summarize(&state.metrics, elapsed_ms)
    }

    /// Groups metrics by `(method, endpoint)` in first-seen order.
    #[must_use]
    pub fn group_by_endpoint(&self) -> Vec<EndpointGroup> {
        let state = self.lock();
        let mut groups: Vec<EndpointGroup> = Vec::new();
        for metric in &state.metrics {
            let existing = groups
                .iter_mut()
                .find(|group| group.method == metric.method && group.name == metric.endpoint);
            match existing {
                Some(group) => group.metrics.push(metric.clone()),
                None => groups.push(EndpointGroup {
                    method: metric.method,
                    name: metric.endpoint.clone(),
                    metrics: vec![metric.clone()],
                }),
            }
        }
        groups
    }

    #[must_use]
    pub fn endpoint_breakdown(&self) -> Vec<EndpointMetrics> {
        endpoint_metrics(&self.group_by_endpoint())
    }

    fn lock(&self) -> MutexGuard<'_, CollectorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
