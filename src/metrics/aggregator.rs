//! Statistical summaries over recorded metrics.

use crate::metrics::Metric;

/// Summary statistics for one metric name.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
}

/// Computes summary statistics over a set of measurements.
///
/// Percentiles use the nearest-rank method over the sorted values; an
/// empty input yields `None`.
pub fn calculate_stats(metrics: &[Metric]) -> Option<MetricStats> {
    if metrics.is_empty() {
        return None;
    }
    let mut values: Vec<f64> = metrics.iter().map(|m| m.value).collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let count = values.len();
    let sum: f64 = values.iter().sum();
    Some(MetricStats {
        count,
        min: values[0],
        max: values[count - 1],
        mean: sum / count as f64,
        p50: percentile(&values, 50.0),
        p95: percentile(&values, 95.0),
    })
}

/// Nearest-rank percentile over pre-sorted values.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}
