//! Global metrics collector.

use crate::error::{BasaltError, BasaltResult};
use crate::metrics::Metric;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::RwLock;

static GLOBAL: Lazy<MetricsCollector> = Lazy::new(MetricsCollector::new);

/// In-memory metric buffer, flushed to disk on demand.
///
/// Recording is a lock-and-push; flushing drains the buffer. Thread-safe
/// behind an `RwLock`, though the server itself is serial.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    buffer: RwLock<Vec<Metric>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide collector.
    pub fn global() -> &'static MetricsCollector {
        &GLOBAL
    }

    pub fn record(&self, metric: Metric) {
        if let Ok(mut buffer) = self.buffer.write() {
            buffer.push(metric);
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.read().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drains the buffer, returning the recorded metrics.
    pub fn drain(&self) -> Vec<Metric> {
        match self.buffer.write() {
            Ok(mut buffer) => std::mem::take(&mut *buffer),
            Err(_) => Vec::new(),
        }
    }

    /// Snapshot of the buffered metrics with a given name.
    pub fn snapshot(&self, name: &str) -> Vec<Metric> {
        self.buffer
            .read()
            .map(|b| b.iter().filter(|m| m.name == name).cloned().collect())
            .unwrap_or_default()
    }

    /// Drains the buffer into one pipe-separated file per metric name
    /// under `dir`. Returns the number of metrics written.
    pub fn flush_to(&self, dir: &Path) -> BasaltResult<usize> {
        let metrics = self.drain();
        if metrics.is_empty() {
            return Ok(0);
        }
        std::fs::create_dir_all(dir).map_err(|e| BasaltError::IoError {
            operation: "create_metrics_dir".to_string(),
            reason: e.to_string(),
        })?;

        let mut by_name: HashMap<&str, Vec<&Metric>> = HashMap::new();
        for metric in &metrics {
            by_name.entry(&metric.name).or_default().push(metric);
        }

        for (name, group) in by_name {
            let path = dir.join(format!("{}.csv", name));
            let is_new = !path.exists();
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| BasaltError::IoError {
                    operation: "open_metrics_file".to_string(),
                    reason: e.to_string(),
                })?;
            let mut text = String::new();
            if is_new {
                text.push_str("timestamp|value|unit|tags\n");
            }
            for metric in group {
                text.push_str(&metric.to_line());
                text.push('\n');
            }
            file.write_all(text.as_bytes())
                .map_err(|e| BasaltError::IoError {
                    operation: "write_metrics".to_string(),
                    reason: e.to_string(),
                })?;
        }
        Ok(metrics.len())
    }
}
