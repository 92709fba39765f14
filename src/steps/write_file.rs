use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::core::{Frame, Step};
use crate::io::FrameSink;

#[derive(Debug, Clone, Deserialize)]
pub struct WriteFileConfig {
    pub output: PathBuf,
}

/// Writes every frame to a sink, without changing it.
pub struct WriteFileStep {
    output: Arc<dyn FrameSink>,
}

impl WriteFileStep {
    pub fn new(output: impl FrameSink + 'static) -> Self {
        Self {
            output: Arc::new(output),
        }
    }
}

#[async_trait]
impl Step for WriteFileStep {
    async fn process_file(&self, frame: &mut Frame) -> Result<()> {
        self.output.write(frame)
    }
}
