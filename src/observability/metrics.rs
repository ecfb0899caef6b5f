use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters for one pipeline stage
pub struct StageMetrics {
    stage: String,
    records_produced: AtomicU64,
    errors_count: AtomicU64,
    total_elapsed_us: AtomicU64,
    runs: AtomicU64,
}

impl StageMetrics {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            records_produced: AtomicU64::new(0),
            errors_count: AtomicU64::new(0),
            total_elapsed_us: AtomicU64::new(0),
            runs: AtomicU64::new(0),
        }
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn records_produced(&self) -> u64 {
        self.records_produced.load(Ordering::Relaxed)
    }

    pub fn errors_count(&self) -> u64 {
        self.errors_count.load(Ordering::Relaxed)
    }

    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }

    pub fn record_produced(&self, count: u64) {
        self.records_produced.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn start(&self) -> Instant {
        Instant::now()
    }

    pub fn finish(&self, start: Instant) {
        let elapsed_us = start.elapsed().as_micros() as u64;
        self.total_elapsed_us.fetch_add(elapsed_us, Ordering::Relaxed);
        self.runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_elapsed_us(&self) -> u64 {
        self.total_elapsed_us.load(Ordering::Relaxed)
    }
}
