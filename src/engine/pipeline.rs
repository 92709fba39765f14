use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::warn;

use crate::core::{Frame, Step, ERRORS_FIELD};
use crate::observability::{MetricsCollector, PipelineMonitor, StepMetrics};
use crate::report::ResultRecorder;

const DEFAULT_PROGRESS_INTERVAL: u64 = 100;

/// One step of a pipeline together with its metrics.
#[derive(Clone)]
pub(crate) struct Stage {
    pub(crate) step: Arc<dyn Step>,
    pub(crate) metrics: Arc<StepMetrics>,
}

/// Run a frame through `stages` in order.
///
/// The first failing step ends the frame's run: its error (or panic message)
/// is stored in the frame's report under `Errors` and logged, and the frame
/// is left as the failing step left it. Failures never escape this function.
pub(crate) async fn run_stages(stages: &[Stage], frame: &mut Frame) {
    for stage in stages {
        let started = std::time::Instant::now();
        let outcome = AssertUnwindSafe(stage.step.process_file(frame))
            .catch_unwind()
            .await;
        let message = match outcome {
            Ok(Ok(())) => {
                stage.metrics.record_success(started.elapsed());
                continue;
            }
            Ok(Err(err)) => format!("{err:#}"),
            Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
        };
        stage.metrics.record_failure(started.elapsed());
        warn!(
            step = stage.step.name(),
            instant = %frame.instant,
            "pipeline failed at {}: {}",
            stage.step.name(),
            message
        );
        frame.annotate(ERRORS_FIELD, message);
        return;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// An ordered chain of steps plus the results gathered from running it.
///
/// A pipeline is itself a [`Step`], so pipelines nest.
pub struct Pipeline {
    pub(crate) stages: Vec<Stage>,
    pub(crate) report: ResultRecorder,
    pub(crate) processed: u64,
    pub(crate) progress_interval: u64,
    pub(crate) queue_depth: Option<usize>,
    metrics: MetricsCollector,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::with_recorder(ResultRecorder::new())
    }

    /// Use `recorder` instead of a fresh one to collect frame reports.
    pub fn with_recorder(recorder: ResultRecorder) -> Self {
        Self {
            stages: Vec::new(),
            report: recorder,
            processed: 0,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            queue_depth: None,
            metrics: MetricsCollector::new(),
        }
    }

    pub fn add_step<S: Step + 'static>(&mut self, step: S) -> &mut Self {
        self.add_shared_step(Arc::new(step))
    }

    pub fn add_boxed_step(&mut self, step: Box<dyn Step>) -> &mut Self {
        self.add_shared_step(Arc::from(step))
    }

    pub fn add_shared_step(&mut self, step: Arc<dyn Step>) -> &mut Self {
        let step_id = format!("{}:{}", self.stages.len(), step.name());
        let metrics = Arc::new(StepMetrics::new(step_id));
        self.metrics.register(metrics.clone());
        self.stages.push(Stage { step, metrics });
        self
    }

    pub fn with_step<S: Step + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    /// Log progress every `interval` frames (0 disables progress logging).
    pub fn set_progress_interval(&mut self, interval: u64) -> &mut Self {
        self.progress_interval = interval;
        self
    }

    /// Cap the number of frames in flight at once. Defaults to twice the
    /// worker count.
    pub fn set_queue_depth(&mut self, depth: usize) -> &mut Self {
        self.queue_depth = Some(depth.max(1));
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.step.name()).collect()
    }

    /// Frames yielded by the driver so far
    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn report(&self) -> &ResultRecorder {
        &self.report
    }

    pub fn report_mut(&mut self) -> &mut ResultRecorder {
        &mut self.report
    }

    pub fn monitor(&self) -> PipelineMonitor {
        PipelineMonitor::new(self.metrics.clone())
    }

    /// Run one frame through every step, in order, on the calling task.
    pub async fn process_file(&self, mut frame: Frame) -> Frame {
        run_stages(&self.stages, &mut frame).await;
        frame
    }

    /// Flush every step, in declaration order.
    pub fn finish(&self) -> anyhow::Result<()> {
        for stage in &self.stages {
            stage.step.finish()?;
        }
        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Step for Pipeline {
    async fn process_file(&self, frame: &mut Frame) -> anyhow::Result<()> {
        run_stages(&self.stages, frame).await;
        Ok(())
    }

    fn finish(&self) -> anyhow::Result<()> {
        Pipeline::finish(self)
    }

    fn name(&self) -> &str {
        "Pipeline"
    }
}
