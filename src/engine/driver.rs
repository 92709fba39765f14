use std::collections::VecDeque;
use std::iter::Fuse;
use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::pipeline::{run_stages, Pipeline, Stage};
use crate::core::Frame;
use crate::error::{EngineError, Result};
use crate::io::FrameSink;
use crate::report::ResultRecorder;

impl Pipeline {
    /// Run every frame of `inputs` through the pipeline on a worker pool.
    ///
    /// With `workers > 1` the pool has exactly that many threads, otherwise
    /// the runtime default of one per CPU. Frames come back in input order,
    /// whatever order they finish in, and each one's report is recorded
    /// before it is yielded. The returned iterator blocks on every pull, so
    /// this must not be called from inside an async context.
    ///
    /// The pool lives as long as the iterator; dropping it early abandons
    /// frames still in flight.
    pub fn process<I>(&mut self, inputs: I, workers: usize) -> Result<Processed<'_, I::IntoIter>>
    where
        I: IntoIterator<Item = Frame>,
    {
        let pool_size = if workers > 1 { workers } else { num_cpus::get() };

        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name("timestream-worker");
        if workers > 1 {
            builder.worker_threads(workers);
        }
        let runtime = builder
            .build()
            .map_err(|source| EngineError::WorkerPool { source })?;

        let queue_depth = self.queue_depth.unwrap_or(pool_size * 2).max(1);
        info!(workers = pool_size, queue_depth, steps = self.len(), "starting pipeline");

        let stages: Arc<[Stage]> = Arc::from(self.stages.clone());
        Ok(Processed {
            pipeline: self,
            inputs: inputs.into_iter().fuse(),
            stages,
            runtime: Some(runtime),
            in_flight: VecDeque::with_capacity(queue_depth),
            queue_depth,
        })
    }

    /// Process `inputs` and hand every resulting frame to `sink`.
    ///
    /// Returns the number of frames written.
    pub fn process_to<I>(&mut self, inputs: I, sink: &dyn FrameSink, workers: usize) -> anyhow::Result<u64>
    where
        I: IntoIterator<Item = Frame>,
    {
        let mut written = 0;
        for frame in self.process(inputs, workers)? {
            sink.write(&frame)?;
            written += 1;
        }
        Ok(written)
    }
}

/// Lazy, input-ordered results of [`Pipeline::process`].
pub struct Processed<'p, I: Iterator> {
    pipeline: &'p mut Pipeline,
    inputs: Fuse<I>,
    stages: Arc<[Stage]>,
    runtime: Option<Runtime>,
    in_flight: VecDeque<JoinHandle<Frame>>,
    queue_depth: usize,
}

impl<I: Iterator<Item = Frame>> Processed<'_, I> {
    /// Frames yielded so far, across every run of the pipeline
    pub fn processed(&self) -> u64 {
        self.pipeline.processed
    }

    /// Results recorded so far; safe to save mid-run as a checkpoint.
    pub fn report(&self) -> &ResultRecorder {
        &self.pipeline.report
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn submit_ready(&mut self) {
        let Some(runtime) = self.runtime.as_ref() else {
            return;
        };
        while self.in_flight.len() < self.queue_depth {
            let Some(mut frame) = self.inputs.next() else {
                break;
            };
            let stages = Arc::clone(&self.stages);
            self.in_flight.push_back(runtime.spawn(async move {
                run_stages(&stages, &mut frame).await;
                frame
            }));
        }
    }

    fn shutdown(&mut self) {
        self.in_flight.clear();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl<I: Iterator<Item = Frame>> Iterator for Processed<'_, I> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        self.submit_ready();

        let Some(handle) = self.in_flight.pop_front() else {
            self.shutdown();
            return None;
        };
        let joined = self.runtime.as_ref()?.block_on(handle);
        let frame = match joined {
            Ok(frame) => frame,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => {
                error!("worker task did not complete: {err}");
                self.shutdown();
                return None;
            }
        };

        let pipeline = &mut *self.pipeline;
        pipeline.report.record(&frame.instant, frame.report.clone());
        pipeline.processed += 1;
        debug!(instant = %frame.instant, errors = frame.has_errors(), "frame done");
        if pipeline.progress_interval > 0 && pipeline.processed % pipeline.progress_interval == 0 {
            info!(processed = pipeline.processed, "processed {} files", pipeline.processed);
        }

        Some(frame)
    }
}

impl<I: Iterator> Drop for Processed<'_, I> {
    fn drop(&mut self) {
        self.in_flight.clear();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
