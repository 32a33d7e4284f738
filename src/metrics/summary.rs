use super::{EndpointGroup, EndpointMetrics, RequestMetric, SummaryMetrics};

const MIN_ELAPSED_MS: u64 = 1_000;

/// Folds `metrics` into run-wide figures.
///
/// `elapsed_ms` is the wall time since collection started; anything under a
/// second counts as one second for the RPS figure. Empty input yields zeros.
#[must_use]
pub fn summarize(metrics: &[RequestMetric], elapsed_ms: u64) -> SummaryMetrics {
    let requests = len_u64(metrics.len());
    if requests == 0 {
        return SummaryMetrics::default();
    }

    let errors = len_u64(metrics.iter().filter(|metric| !metric.success).count());
    let mut durations: Vec<u64> = metrics.iter().map(|metric| metric.duration_ms).collect();
    durations.sort_unstable();
    let total_ms = durations
        .iter()
        .fold(0_u64, |sum, duration| sum.saturating_add(*duration));

    SummaryMetrics {
        requests,
        rps_x100: round_div(
            requests.saturating_mul(100_000),
            elapsed_ms.max(MIN_ELAPSED_MS),
        ),
        error_rate_x100: round_div(errors.saturating_mul(10_000), requests),
        avg_latency_ms: round_div(total_ms, requests),
        p95_latency_ms: percentile(&durations, 95),
        p99_latency_ms: percentile(&durations, 99),
    }
}

/// Per-endpoint figures, one entry per group in group order.
#[must_use]
pub fn endpoint_metrics(groups: &[EndpointGroup]) -> Vec<EndpointMetrics> {
    groups
        .iter()
        .map(|group| {
            let summary = summarize(&group.metrics, MIN_ELAPSED_MS);
            EndpointMetrics {
                name: group.name.clone(),
                method: group.method,
                requests: summary.requests,
                error_rate_x100: summary.error_rate_x100,
                avg_latency_ms: summary.avg_latency_ms,
                p95_latency_ms: summary.p95_latency_ms,
            }
        })
        .collect()
}

/// Nearest-rank percentile of ascending `sorted` values: the element at
/// `ceil(p / 100 * n) - 1`, clamped at the first element. `0` when empty.
#[must_use]
pub fn percentile(sorted: &[u64], p: u64) -> u64 {
    let count = len_u64(sorted.len());
    let rank = p
        .saturating_mul(count)
        .saturating_add(99)
        .checked_div(100)
        .unwrap_or(0);
    let index = usize::try_from(rank.saturating_sub(1)).unwrap_or(usize::MAX);
    sorted
        .get(index)
        .or_else(|| sorted.last())
        .copied()
        .unwrap_or(0)
}

/// Renders a value scaled by 100 with two decimals.
#[must_use]
pub fn format_x100(value: u64) -> String {
    let whole = value.checked_div(100).unwrap_or(0);
    let fraction = value.checked_rem(100).unwrap_or(0);
    format!("{}.{:02}", whole, fraction)
}

/// `numerator / denominator` rounded half up; `0` for a zero denominator.
fn round_div(numerator: u64, denominator: u64) -> u64 {
    numerator
        .saturating_mul(2)
        .saturating_add(denominator)
        .checked_div(denominator.saturating_mul(2))
        .unwrap_or(0)
}

fn len_u64(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}
