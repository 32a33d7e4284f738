//! Per-request metrics and their summaries.
mod collector;
mod summary;
mod types;


pub use collector::MetricsCollector;
pub use summary::{endpoint_metrics, format_x100, percentile, summarize};
pub use types::{
    EndpointGroup, EndpointMetrics, RequestMetric, SummaryMetrics, is_success_status,
};
