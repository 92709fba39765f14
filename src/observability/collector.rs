use std::sync::Arc;

use super::StepMetrics;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub step_id: String,
    pub frames_processed: u64,
    pub errors_count: u64,
    pub avg_latency_us: u64,
    pub max_latency_us: u64,
}

/// Registry of step metrics, kept in pipeline order.
#[derive(Clone, Default)]
pub struct MetricsCollector {
    metrics: Vec<Arc<StepMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, metrics: Arc<StepMetrics>) {
        self.metrics.push(metrics);
    }

    pub fn snapshot(&self) -> Vec<MetricsSnapshot> {
        self.metrics
            .iter()
            .map(|metrics| MetricsSnapshot {
                step_id: metrics.step_id().to_string(),
                frames_processed: metrics.frames_processed(),
                errors_count: metrics.errors_count(),
                avg_latency_us: metrics.avg_latency_us(),
                max_latency_us: metrics.max_latency_us(),
            })
            .collect()
    }

    pub fn get_step_metrics(&self, step_id: &str) -> Option<Arc<StepMetrics>> {
        self.metrics
            .iter()
            .find(|metrics| metrics.step_id() == step_id)
            .cloned()
    }

    pub fn total_errors(&self) -> u64 {
        self.metrics.iter().map(|metrics| metrics.errors_count()).sum()
    }
}
