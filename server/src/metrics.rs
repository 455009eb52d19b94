use parking_lot::Mutex;
use ragcore::scoring::{mean, percentile};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub total_requests: u64,
    pub denylist_hits: u64,
    pub low_confidence_count: u64,
    pub latency_ms_mean: f64,
    pub latency_ms_p95: f64,
    pub low_confidence_rate: f64,
}

/// Request counters plus a window of the most recent latency samples.
#[derive(Debug)]
pub struct MetricsCollector {
    max_samples: usize,
    latency_samples: Mutex<VecDeque<f64>>,
    total_requests: AtomicU64,
    denylist_hits: AtomicU64,
    low_confidence_count: AtomicU64,
}

impl MetricsCollector {
    pub fn new(max_samples: usize) -> Self {
        Self {
            max_samples,
            latency_samples: Mutex::new(VecDeque::new()),
            total_requests: AtomicU64::new(0),
            denylist_hits: AtomicU64::new(0),
            low_confidence_count: AtomicU64::new(0),
        }
    }

    /// Append a sample, dropping the oldest beyond the window.
    pub fn record_latency(&self, latency_ms: f64) {
        let mut samples = self.latency_samples.lock();
        samples.push_back(latency_ms);
        while samples.len() > self.max_samples {
            samples.pop_front();
        }
    }

    pub fn incr_total_requests(&self) { self.total_requests.fetch_add(1, Ordering::Relaxed); }

    pub fn incr_denylist_hits(&self) { self.denylist_hits.fetch_add(1, Ordering::Relaxed); }

    pub fn incr_low_confidence(&self) { self.low_confidence_count.fetch_add(1, Ordering::Relaxed); }

    pub fn latency_samples(&self) -> Vec<f64> {
        self.latency_samples.lock().iter().copied().collect()
    }

    pub fn report(&self) -> MetricsReport {
        let samples = self.latency_samples();
        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let low_confidence_count = self.low_confidence_count.load(Ordering::Relaxed);
        let low_confidence_rate = if total_requests == 0 { 0.0 } else { low_confidence_count as f64 / total_requests as f64 };
        MetricsReport {
            total_requests,
            denylist_hits: self.denylist_hits.load(Ordering::Relaxed),
            low_confidence_count,
            latency_ms_mean: mean(&samples),
            latency_ms_p95: percentile(&samples, 95.0),
            low_confidence_rate,
        }
    }
}
