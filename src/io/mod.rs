//! Frame sources and sinks.
//!
//! Archive formats live outside this crate; anything that yields frames can
//! feed a pipeline, and anything implementing [`FrameSink`] can take its output.

pub mod directory;

use std::sync::Arc;

use anyhow::Result;

use crate::core::Frame;

pub use directory::{DirectoryFrames, DirectorySink, DirectorySource};

/// Destination for processed frames
pub trait FrameSink: Send + Sync {
    fn write(&self, frame: &Frame) -> Result<()>;
}

impl<S: FrameSink + ?Sized> FrameSink for Arc<S> {
    fn write(&self, frame: &Frame) -> Result<()> {
        (**self).write(frame)
    }
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn write(&self, frame: &Frame) -> Result<()> {
        (**self).write(frame)
    }
}
