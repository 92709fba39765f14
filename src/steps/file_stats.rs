use anyhow::Result;
use async_trait::async_trait;

use crate::core::{Frame, Step};

/// Records each file's name and size in bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStatsStep;

#[async_trait]
impl Step for FileStatsStep {
    async fn process_file(&self, frame: &mut Frame) -> Result<()> {
        let name = frame.basename();
        frame.annotate("FileName", name);
        frame.annotate("FileSize", frame.content.len());
        Ok(())
    }
}
