// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Destinations for rendered artifacts.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{Level, event};

use crate::emit::Artifact;
use crate::{Error, Result};

/// Receives rendered artifacts.
///
/// Writing an artifact to a path that already holds one replaces it; the placeholder written
/// during generation is overwritten this way by the final artifact.
pub trait ArtifactSink {
    /// Writes `artifact`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the artifact cannot be stored.
    fn write(&mut self, artifact: &Artifact) -> Result<()>;
}

impl<K: ArtifactSink + ?Sized> ArtifactSink for &mut K {
    fn write(&mut self, artifact: &Artifact) -> Result<()> {
        (**self).write(artifact)
    }
}

/// Writes artifacts below a root directory.
///
/// Each file is written to a temporary sibling and renamed into place, so readers see either the
/// previous content or the new content and never a truncated file.
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    /// Creates a sink writing below `root`. Directories are created on demand.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactSink for OutputDir {
    fn write(&mut self, artifact: &Artifact) -> Result<()> {
        let path = self.root.join(artifact.path());
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

        let mut file = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
        file.write_all(artifact.contents().as_bytes())
            .map_err(|e| Error::io(&path, e))?;
        file.persist(&path).map_err(|e| Error::io(&path, e.error))?;

        event!(Level::DEBUG, path = %path.display(), merge_point = %artifact.merge_point(), "artifact written");
        Ok(())
    }
}

/// Keeps artifacts in memory, keyed by their relative path.
#[derive(Debug, Clone, Default)]
pub struct MemoryOutput {
    files: BTreeMap<PathBuf, String>,
    writes: usize,
}

impl MemoryOutput {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current content at `path`.
    #[must_use]
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }

    /// Every stored file in path order.
    pub fn files(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.files.iter().map(|(path, contents)| (path.as_path(), contents.as_str()))
    }

    /// Number of distinct paths written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total number of writes, counting overwrites.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.writes
    }
}

impl ArtifactSink for MemoryOutput {
    fn write(&mut self, artifact: &Artifact) -> Result<()> {
        self.files.insert(artifact.path().to_path_buf(), artifact.contents().to_owned());
        self.writes += 1;
        Ok(())
    }
}
