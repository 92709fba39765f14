use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::core::{Frame, Step};
use crate::report::ResultRecorder;

fn default_interval() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultRecorderConfig {
    pub output: PathBuf,
    #[serde(default = "default_interval")]
    pub interval: u64,
}

#[derive(Default)]
struct RecorderState {
    recorder: ResultRecorder,
    seen: u64,
}

/// Records the report of every frame passing through, saving the table every
/// `interval` frames and once more on `finish`.
pub struct ResultRecorderStep {
    output_file: PathBuf,
    write_interval: u64,
    state: Mutex<RecorderState>,
}

impl ResultRecorderStep {
    pub fn new(output_file: impl Into<PathBuf>) -> Self {
        Self {
            output_file: output_file.into(),
            write_interval: default_interval(),
            state: Mutex::new(RecorderState::default()),
        }
    }

    pub fn from_config(config: ResultRecorderConfig) -> Self {
        Self::new(config.output).with_interval(config.interval)
    }

    /// Save every `interval` frames; 0 only saves on `finish`.
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.write_interval = interval;
        self
    }

    pub fn output_file(&self) -> &Path {
        &self.output_file
    }

    /// A copy of everything recorded so far
    pub fn snapshot(&self) -> ResultRecorder {
        self.lock().recorder.clone()
    }

    fn lock(&self) -> MutexGuard<'_, RecorderState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Step for ResultRecorderStep {
    async fn process_file(&self, frame: &mut Frame) -> Result<()> {
        let mut state = self.lock();
        state.recorder.record(&frame.instant, frame.report.clone());
        state.seen += 1;
        if self.write_interval > 0 && state.seen % self.write_interval == 0 {
            state.recorder.save(&self.output_file)?;
            info!(frames = state.seen, path = %self.output_file.display(), "checkpointed results");
        }
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        self.lock().recorder.save(&self.output_file)?;
        Ok(())
    }
}
