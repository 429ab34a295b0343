// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::{QualifiedName, Scope};

/// Errors raised while scanning, resolving or emitting contributions.
///
/// Every variant carries enough context (declaration, scope, file) to act on without re-running
/// the build. Failures are deterministic for a given set of inputs, so none of them is retried.
///
/// How far an error reaches depends on the variant:
///
/// - [`Error::Resolution`] drops the contributions of one declaration.
/// - [`Error::BindingContract`] and [`Error::Emit`] drop the artifacts of one scope.
/// - [`Error::Io`] and [`Error::CorruptHint`] abort the whole invocation, see [`Error::is_fatal`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An annotation argument or class literal could not be resolved to a declaration.
    #[error("cannot process `{declaration}` ({}): {reason}", .file.display())]
    Resolution {
        /// The declaration being processed.
        declaration: QualifiedName,
        /// The file the declaration originates from.
        file: PathBuf,
        /// What could not be resolved.
        reason: String,
    },

    /// A contributed binding does not implement the type it claims to bind.
    #[error(
        "`{concrete}` is contributed to `{scope}` bound as `{bound}` but does not implement `{bound}` ({})",
        .file.display()
    )]
    BindingContract {
        /// The contributed concrete type.
        concrete: QualifiedName,
        /// The declared bound type.
        bound: QualifiedName,
        /// The scope being merged.
        scope: Scope,
        /// The file the binding originates from.
        file: PathBuf,
    },

    /// The emitter rejected an artifact request.
    #[error("cannot emit `{artifact}` for scope `{scope}`: {reason}")]
    Emit {
        /// The merge point whose artifact was being emitted.
        artifact: QualifiedName,
        /// The scope being merged.
        scope: Scope,
        /// The emitter's explanation.
        reason: String,
    },

    /// An output directory or file could not be read or written.
    #[error("I/O failure at {}", .path.display())]
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// A persisted hint marker could not be decoded.
    #[error("hint marker {} is corrupt", .path.display())]
    CorruptHint {
        /// The marker file.
        path: PathBuf,
        /// The decoding error.
        #[source]
        source: serde_json::Error,
    },
}

/// A specialized `Result` for contribution processing.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn resolution(declaration: &QualifiedName, file: &Path, reason: impl Into<String>) -> Self {
        Self::Resolution {
            declaration: declaration.clone(),
            file: file.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error invalidates the whole invocation rather than one declaration or scope.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::CorruptHint { .. })
    }
}
