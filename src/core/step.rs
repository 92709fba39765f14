use anyhow::Result;
use async_trait::async_trait;

use super::Frame;

/// Base trait for all pipeline steps
///
/// A step transforms or annotates one frame at a time. The same instance is
/// shared by every worker, so any state a step keeps between frames must be
/// behind its own synchronisation.
#[async_trait]
pub trait Step: Send + Sync {
    /// Process one frame in place. An error stops the frame's journey through
    /// the pipeline, but not the batch.
    async fn process_file(&self, _frame: &mut Frame) -> Result<()> {
        Ok(())
    }

    /// Called once after every frame has been drained, to flush buffered state
    fn finish(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }
}
