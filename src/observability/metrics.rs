use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters for one pipeline stage.
///
/// Updated concurrently by every worker that runs the stage; reads are
/// relaxed snapshots.
pub struct StepMetrics {
    step_id: String,
    frames_processed: AtomicU64,
    errors_count: AtomicU64,
    busy_us: AtomicU64,
    max_latency_us: AtomicU64,
}

impl StepMetrics {
    pub fn new(step_id: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            frames_processed: AtomicU64::new(0),
            errors_count: AtomicU64::new(0),
            busy_us: AtomicU64::new(0),
            max_latency_us: AtomicU64::new(0),
        }
    }

    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    /// Frames the stage handled successfully
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed.load(Ordering::Relaxed)
    }

    pub fn errors_count(&self) -> u64 {
        self.errors_count.load(Ordering::Relaxed)
    }

    pub fn record_success(&self, elapsed: Duration) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
        self.add_latency(elapsed);
    }

    pub fn record_failure(&self, elapsed: Duration) {
        self.errors_count.fetch_add(1, Ordering::Relaxed);
        self.add_latency(elapsed);
    }

    fn add_latency(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.busy_us.fetch_add(micros, Ordering::Relaxed);
        self.max_latency_us.fetch_max(micros, Ordering::Relaxed);
    }

    /// Mean time spent per frame, failures included
    pub fn avg_latency_us(&self) -> u64 {
        let samples = self.frames_processed() + self.errors_count();
        if samples == 0 {
            return 0;
        }
        self.busy_us.load(Ordering::Relaxed) / samples
    }

    pub fn max_latency_us(&self) -> u64 {
        self.max_latency_us.load(Ordering::Relaxed)
    }
}
