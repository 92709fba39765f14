use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use glob::MatchOptions;

use super::FrameSink;
use crate::core::Frame;
use crate::error::Result;

/// Every regular file below a directory, as frames.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    extension: Option<String>,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: None,
        }
    }

    /// Only yield files with this extension (case-insensitive, without the dot).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.extension = Some(extension.trim_start_matches('.').to_string());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Matching file paths in sorted order
    pub fn paths(&self) -> Result<Vec<PathBuf>> {
        let root = glob::Pattern::escape(&self.root.to_string_lossy());
        let pattern = match &self.extension {
            Some(extension) => format!("{root}/**/*.{}", glob::Pattern::escape(extension)),
            None => format!("{root}/**/*"),
        };
        let options = MatchOptions {
            case_sensitive: false,
            ..MatchOptions::new()
        };

        let mut paths = Vec::new();
        for entry in glob::glob_with(&pattern, options)? {
            let path = entry.map_err(glob::GlobError::into_error)?;
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Lazily load frames. File names without a timestamp, and unreadable
    /// files, come through as errors for the caller to handle.
    pub fn frames(&self) -> Result<DirectoryFrames> {
        Ok(DirectoryFrames {
            paths: self.paths()?.into_iter(),
        })
    }
}

pub struct DirectoryFrames {
    paths: std::vec::IntoIter<PathBuf>,
}

impl Iterator for DirectoryFrames {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.paths.next().map(Frame::load)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.paths.size_hint()
    }
}

/// Writes each frame's content to `<root>/<file name>`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, frame: &Frame) -> PathBuf {
        self.root.join(frame.basename())
    }
}

impl FrameSink for DirectorySink {
    fn write(&self, frame: &Frame) -> anyhow::Result<()> {
        if frame.basename().is_empty() {
            bail!("frame {} has no file name", frame.instant);
        }
        fs::create_dir_all(&self.root)
            .with_context(|| format!("creating output directory {}", self.root.display()))?;
        let path = self.path_for(frame);
        fs::write(&path, &frame.content).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}
