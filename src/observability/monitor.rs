use super::MetricsCollector;

pub struct PipelineMonitor {
    collector: MetricsCollector,
}

impl PipelineMonitor {
    pub fn new(collector: MetricsCollector) -> Self {
        Self { collector }
    }

    pub fn generate_report(&self) -> String {
        let snapshot = self.collector.snapshot();

        if snapshot.is_empty() {
            return "No steps registered".to_string();
        }

        let mut report = String::from("=== Pipeline Metrics ===\n");

        for metrics in &snapshot {
            let errors = match metrics.errors_count {
                0 => "0 errors".to_string(),
                1 => "1 error".to_string(),
                n => format!("{n} errors"),
            };
            report.push_str(&format!(
                "\n[{}]\n  Frames: {} frames processed\n  Errors: {}\n  Latency: {}μs avg, {}μs max\n",
                metrics.step_id,
                metrics.frames_processed,
                errors,
                metrics.avg_latency_us,
                metrics.max_latency_us
            ));
        }

        report
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.collector
    }
}
