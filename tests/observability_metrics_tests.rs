use std::sync::Arc;
use std::time::Duration;

use timestream::observability::{MetricsCollector, PipelineMonitor, StepMetrics};
use timestream::steps::FileStatsStep;
use timestream::Pipeline;

#[test]
fn test_step_metrics_counts_and_latency() {
    let metrics = StepMetrics::new("0:FileStatsStep");

    assert_eq!(metrics.avg_latency_us(), 0);
    metrics.record_success(Duration::from_micros(100));
    metrics.record_success(Duration::from_micros(300));
    metrics.record_failure(Duration::from_micros(200));

    assert_eq!(metrics.step_id(), "0:FileStatsStep");
    assert_eq!(metrics.frames_processed(), 2);
    assert_eq!(metrics.errors_count(), 1);
    assert_eq!(metrics.avg_latency_us(), 200);
    assert_eq!(metrics.max_latency_us(), 300);
}

#[test]
fn test_collector_snapshot_in_registration_order() {
    let mut collector = MetricsCollector::new();
    let first = Arc::new(StepMetrics::new("0:A"));
    let second = Arc::new(StepMetrics::new("1:B"));
    collector.register(first.clone());
    collector.register(second.clone());

    first.record_success(Duration::from_micros(10));
    second.record_failure(Duration::from_micros(30));
    second.record_failure(Duration::from_micros(10));

    let snapshot = collector.snapshot();
    let ids: Vec<&str> = snapshot.iter().map(|s| s.step_id.as_str()).collect();
    assert_eq!(ids, vec!["0:A", "1:B"]);
    assert_eq!(snapshot[1].errors_count, 2);
    assert_eq!(snapshot[1].avg_latency_us, 20);
    assert_eq!(collector.total_errors(), 2);
    assert!(collector.get_step_metrics("2:C").is_none());
}

#[test]
fn test_monitor_report() {
    let empty = PipelineMonitor::new(MetricsCollector::new());
    assert_eq!(empty.generate_report(), "No steps registered");

    let mut collector = MetricsCollector::new();
    let metrics = Arc::new(StepMetrics::new("0:Decode"));
    collector.register(metrics.clone());
    metrics.record_success(Duration::from_micros(50));
    metrics.record_failure(Duration::from_micros(150));

    let report = PipelineMonitor::new(collector).generate_report();
    assert!(report.starts_with("=== Pipeline Metrics ==="));
    assert!(report.contains("[0:Decode]"));
    assert!(report.contains("1 frames processed"));
    assert!(report.contains("Errors: 1 error\n"));
    assert!(report.contains("Latency: 100μs avg, 150μs max"));
}

#[test]
fn test_pipeline_registers_every_step() {
    let mut pipe = Pipeline::new().with_step(FileStatsStep);
    pipe.add_step(Pipeline::new());

    let ids: Vec<String> = pipe
        .monitor()
        .collector()
        .snapshot()
        .into_iter()
        .map(|s| s.step_id)
        .collect();
    assert_eq!(ids, vec!["0:FileStatsStep", "1:Pipeline"]);
}
