use serde::Serialize;
use std::sync::Mutex;

/// Process-local counters for pipeline activity.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub series_processed: usize,
    pub series_failed: usize,
    pub peaks_detected: usize,
}

#[derive(Default)]
struct Metrics {
    series_processed: usize,
    series_failed: usize,
    peaks_detected: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_processed(&self, peaks: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.series_processed += 1;
            metrics.peaks_detected += peaks;
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.series_failed += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            MetricsSnapshot {
                series_processed: metrics.series_processed,
                series_failed: metrics.series_failed,
                peaks_detected: metrics.peaks_detected,
            }
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = MetricsRecorder::new();
        metrics.record_processed(3);
        metrics.record_processed(1);
        metrics.record_error();
        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                series_processed: 2,
                series_failed: 1,
                peaks_detected: 4,
            }
        );
    }
}
