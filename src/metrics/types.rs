use serde::Serialize;

use crate::http::HttpMethod;

use super::format_x100;

/// Statuses in `[200, 400)` count as successful.
#[must_use]
pub const fn is_success_status(status: u16) -> bool {
    status >= 200 && status < 400
}

/// One completed HTTP call. Never mutated after it is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestMetric {
    pub endpoint: String,
    pub method: HttpMethod,
    pub status: u16,
    pub duration_ms: u64,
    /// Unix epoch milliseconds at dispatch.
    pub started_at_ms: i64,
    pub success: bool,
}

impl RequestMetric {
    #[must_use]
    pub fn new<N>(
        endpoint: N,
        method: HttpMethod,
        status: u16,
        duration_ms: u64,
        started_at_ms: i64,
    ) -> Self
    where
        N: Into<String>,
    {
        Self {
            endpoint: endpoint.into(),
            method,
            status,
            duration_ms,
            started_at_ms,
            success: is_success_status(status),
        }
    }
}

/// Run-wide figures. Fields ending in `_x100` hold the value times 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryMetrics {
    pub requests: u64,
    pub rps_x100: u64,
    pub error_rate_x100: u64,
    pub avg_latency_ms: u64,
    pub p95_latency_ms: u64,
    pub p99_latency_ms: u64,
}

impl SummaryMetrics {
    /// Requests per second with two decimals, e.g. `12.50`.
    #[must_use]
    pub fn rps(&self) -> String {
        format_x100(self.rps_x100)
    }

    /// Error percentage with two decimals, e.g. `7.00`.
    #[must_use]
    pub fn error_rate(&self) -> String {
        format_x100(self.error_rate_x100)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointMetrics {
    pub name: String,
    pub method: HttpMethod,
    pub requests: u64,
    pub error_rate_x100: u64,
    pub avg_latency_ms: u64,
    pub p95_latency_ms: u64,
}

impl EndpointMetrics {
    #[must_use]
    pub fn error_rate(&self) -> String {
        format_x100(self.error_rate_x100)
    }
}

/// Metrics of one `(method, endpoint)` pair in recording order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointGroup {
    pub method: HttpMethod,
    pub name: String,
    pub metrics: Vec<RequestMetric>,
}

impl EndpointGroup {
    /// `"<METHOD> <name>"`, the label reports use.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{} {}", self.method, self.name)
    }
}
