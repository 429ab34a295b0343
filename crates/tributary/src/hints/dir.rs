// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{Level, event};

use super::{HintKind, HintMarker, HintRecord, HintStore};
use crate::model::{QualifiedName, Scope};
use crate::{Error, Result};

const MARKER_EXTENSION: &str = "json";

/// A hint store backed by a directory, one JSON marker file per recorded hint.
///
/// Markers live at `<root>/<kind prefix>/<scope>/<name>.json`, so a lookup lists one directory
/// instead of scanning the whole index. Several processes may share the same root: markers are
/// written to a temporary file and renamed into place, so readers never observe partial content.
#[derive(Debug, Clone)]
pub struct DirHintStore {
    root: PathBuf,
}

impl DirHintStore {
    /// Creates a store rooted at `root`. The directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scope_dir(&self, kind: HintKind, scope: &Scope) -> PathBuf {
        self.root.join(kind.prefix()).join(encode_component(scope.name()))
    }

    fn marker_path(&self, marker: &HintMarker) -> PathBuf {
        let mut file = encode_component(marker.name());
        file.push('.');
        file.push_str(MARKER_EXTENSION);
        self.scope_dir(marker.kind(), marker.scope()).join(file)
    }
}

impl HintStore for DirHintStore {
    fn record(&mut self, marker: &HintMarker, record: &HintRecord) -> Result<()> {
        let path = self.marker_path(marker);
        if path.exists() {
            return Ok(());
        }

        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

        let mut file = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
        serde_json::to_writer_pretty(&mut file, record).map_err(|e| Error::io(&path, io::Error::from(e)))?;
        file.flush().map_err(|e| Error::io(&path, e))?;
        file.persist(&path).map_err(|e| Error::io(&path, e.error))?;

        event!(Level::TRACE, path = %path.display(), "hint marker written");
        Ok(())
    }

    fn lookup(&self, scope: &Scope, kind: HintKind) -> Result<BTreeMap<QualifiedName, HintRecord>> {
        let dir = self.scope_dir(kind, scope);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(Error::io(dir, e)),
        };

        let mut records = BTreeMap::new();
        for entry in entries {
            let path = entry.map_err(|e| Error::io(&dir, e))?.path();
            if path.extension().is_none_or(|extension| extension != MARKER_EXTENSION) {
                continue;
            }

            let text = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
            let record: HintRecord = serde_json::from_str(&text).map_err(|source| Error::CorruptHint { path, source })?;
            records.insert(record.declaration().name().clone(), record);
        }

        Ok(records)
    }
}

/// Turns a qualified name into a single portable file name component.
///
/// `::` becomes `.`, ASCII alphanumerics, `_` and `-` are kept and every other byte is written as
/// `~XX`. The mapping is injective, so distinct names never share a marker file.
fn encode_component(name: &QualifiedName) -> String {
    let mut encoded = String::with_capacity(name.as_str().len());
    for (index, segment) in name.segments().enumerate() {
        if index > 0 {
            encoded.push('.');
        }
        for byte in segment.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
                encoded.push(char::from(byte));
            } else {
                encoded.push_str(&format!("~{byte:02X}"));
            }
        }
    }
    encoded
}
