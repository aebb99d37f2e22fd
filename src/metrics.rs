//! Metrics module - Tick timing and simulation counters

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn new_histogram() -> Histogram<u64> {
    // 3 significant digits is always a valid precision
    Histogram::new(3).expect("valid histogram precision")
}

// ============================================================================
// TIMING METRICS - Shared between a simulation and whoever reports on it
// ============================================================================

#[derive(Clone)]
pub struct TimingMetrics {
    tick_hist: Arc<Mutex<Histogram<u64>>>,
    inference_hist: Arc<Mutex<Histogram<u64>>>,
    ticks: Arc<AtomicU64>,
    alerts: Arc<AtomicU64>,
    publish_failures: Arc<AtomicU64>,
}

impl Default for TimingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingMetrics {
    pub fn new() -> Self {
        Self {
            tick_hist: Arc::new(Mutex::new(new_histogram())),
            inference_hist: Arc::new(Mutex::new(new_histogram())),
            ticks: Arc::new(AtomicU64::new(0)),
            alerts: Arc::new(AtomicU64::new(0)),
            publish_failures: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn record_tick(&self, duration: Duration) {
        self.tick_hist.lock().record(duration.as_nanos() as u64).ok();
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inference(&self, duration: Duration) {
        self.inference_hist.lock().record(duration.as_nanos() as u64).ok();
    }

    pub fn record_alerts(&self, count: usize) {
        self.alerts.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_publish_failures(&self, count: u64) {
        self.publish_failures.fetch_add(count, Ordering::Relaxed);
    }

    pub fn report(&self) -> MetricsReport {
        let tick = self.tick_hist.lock();
        let inference = self.inference_hist.lock();

        MetricsReport {
            tick_p50: Duration::from_nanos(tick.value_at_quantile(0.5)),
            tick_p99: Duration::from_nanos(tick.value_at_quantile(0.99)),
            inference_p50: Duration::from_nanos(inference.value_at_quantile(0.5)),
            inference_p99: Duration::from_nanos(inference.value_at_quantile(0.99)),
            ticks: self.ticks.load(Ordering::Relaxed),
            alerts: self.alerts.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// METRICS REPORT - Summary statistics
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsReport {
    pub tick_p50: Duration,
    pub tick_p99: Duration,
    pub inference_p50: Duration,
    pub inference_p99: Duration,
    pub ticks: u64,
    pub alerts: u64,
    pub publish_failures: u64,
}
