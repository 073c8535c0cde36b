//! Metrics infrastructure for Basalt observability.
//!
//! Lightweight in-process monitoring: engines record timing and size
//! metrics into a global collector; the server flushes them periodically
//! to pipe-separated files under `<data_dir>/metrics/`.
//!
//! ```rust
//! use basalt::metrics::{Metric, MetricUnit, MetricsCollector};
//!
//! MetricsCollector::global().record(
//!     Metric::new("query_duration_us", 1250.0, MetricUnit::Microseconds)
//!         .with_tag("operator", "select"),
//! );
//! ```
//!
//! ## Storage format
//!
//! One file per metric name:
//!
//! ```csv
//! timestamp|value|unit|tags
//! 2026-08-01T12:00:00.000Z|1250.50|us|operator=select
//! ```

pub mod aggregator;
pub mod collector;


pub use aggregator::{calculate_stats, MetricStats};
pub use collector::MetricsCollector;

use std::fmt;

/// Unit a metric value is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricUnit {
    Microseconds,
    Count,
    Bytes,
}

impl fmt::Display for MetricUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Microseconds => write!(f, "us"),
            Self::Count => write!(f, "count"),
            Self::Bytes => write!(f, "bytes"),
        }
    }
}

/// One recorded measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    pub unit: MetricUnit,
    pub tags: Vec<(String, String)>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Metric {
    pub fn new(name: &str, value: f64, unit: MetricUnit) -> Self {
        Self {
            name: name.to_string(),
            value,
            unit,
            tags: Vec::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.push((key.to_string(), value.to_string()));
        self
    }

    /// Storage line: `timestamp|value|unit|k=v,k=v`.
    pub fn to_line(&self) -> String {
        let tags: Vec<String> = self
            .tags
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!(
            "{}|{:.2}|{}|{}",
            self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            self.value,
            self.unit,
            tags.join(",")
        )
    }
}
