use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Instant;
use crate::error::Result;

/// Report field a failing step's error message is stored under.
pub const ERRORS_FIELD: &str = "Errors";

/// One file of a timestream travelling through a pipeline.
///
/// Frames are self-contained values (no open handles) so they can be moved
/// freely between workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub instant: Instant,
    pub filename: PathBuf,
    pub content: Vec<u8>,

    /// Metrics accumulated by steps, in the order they were first written
    pub report: Map<String, Value>,
}

impl Frame {
    pub fn new(instant: Instant, filename: impl Into<PathBuf>, content: Vec<u8>) -> Self {
        Self {
            instant,
            filename: filename.into(),
            content,
            report: Map::new(),
        }
    }

    /// Build a frame whose instant is taken from its file name.
    pub fn from_path(filename: impl Into<PathBuf>, content: Vec<u8>) -> Result<Self> {
        let filename = filename.into();
        let instant = Instant::from_path(&filename)?;
        Ok(Self::new(instant, filename, content))
    }

    /// Read a frame from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let instant = Instant::from_path(path)?;
        let content = std::fs::read(path)?;
        Ok(Self::new(instant, path, content))
    }

    pub fn annotate(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.report.insert(key.into(), value.into());
    }

    pub fn basename(&self) -> String {
        self.filename
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn has_errors(&self) -> bool {
        self.report.contains_key(ERRORS_FIELD)
    }
}
