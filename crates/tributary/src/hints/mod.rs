// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The hint index: durable markers that make contributions discoverable across invocations.
//!
//! Every binding or module contribution found by the scanner is recorded as a [`HintMarker`]
//! keyed by `(kind, scope, name)`. Later invocations, including ones that compile a different
//! crate against the same hint storage, look markers up by `(kind, scope)` and reconstruct the
//! contributions without access to the original sources.
//!
//! The store is append-only. Recording an existing key is a no-op, so concurrent writers racing
//! on the same key converge on the same content and need no coordination beyond atomic creation.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::model::{Declaration, QualifiedName, Scope};

mod dir;
mod memory;

pub use dir::DirHintStore;
pub use memory::MemoryHintStore;

/// The namespace a hint is recorded under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HintKind {
    /// Binding contributions.
    Binding,
    /// Module and interface contributions.
    Contribution,
}

impl HintKind {
    /// The fixed storage prefix of this kind.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Binding => "binding",
            Self::Contribution => "contribution",
        }
    }
}

impl fmt::Display for HintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// The key of one hint: a contribution of `name` to `scope`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HintMarker {
    kind: HintKind,
    scope: Scope,
    name: QualifiedName,
}

impl HintMarker {
    /// Creates a marker.
    #[must_use]
    pub fn new(kind: HintKind, scope: Scope, name: QualifiedName) -> Self {
        Self { kind, scope, name }
    }

    /// The kind of contribution.
    #[must_use]
    pub const fn kind(&self) -> HintKind {
        self.kind
    }

    /// The scope the contribution targets.
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// The contributing declaration.
    #[must_use]
    pub const fn name(&self) -> &QualifiedName {
        &self.name
    }
}

/// The payload stored with a hint: a snapshot of the contributing declaration.
///
/// `supertypes` is the transitive supertype closure at the time the hint was recorded. Readers
/// that cannot see the declaration's supertypes still validate bindings against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintRecord {
    declaration: Declaration,
    supertypes: BTreeSet<QualifiedName>,
}

impl HintRecord {
    /// Creates a record.
    #[must_use]
    pub const fn new(declaration: Declaration, supertypes: BTreeSet<QualifiedName>) -> Self {
        Self { declaration, supertypes }
    }

    /// The declaration snapshot.
    #[must_use]
    pub const fn declaration(&self) -> &Declaration {
        &self.declaration
    }

    /// Every transitive supertype of the declaration.
    #[must_use]
    pub const fn supertypes(&self) -> &BTreeSet<QualifiedName> {
        &self.supertypes
    }
}

/// Append-only storage for hint markers.
pub trait HintStore {
    /// Records `marker` with its payload. Recording an already present marker has no effect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) when the store cannot be written.
    fn record(&mut self, marker: &HintMarker, record: &HintRecord) -> Result<()>;

    /// Returns every record ever stored for `(scope, kind)`, keyed by contribution name.
    ///
    /// Callers must not rely on the order in which records were written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) when the store cannot be read and
    /// [`Error::CorruptHint`](crate::Error::CorruptHint) when a stored payload cannot be decoded.
    fn lookup(&self, scope: &Scope, kind: HintKind) -> Result<BTreeMap<QualifiedName, HintRecord>>;
}

impl<S: HintStore + ?Sized> HintStore for &mut S {
    fn record(&mut self, marker: &HintMarker, record: &HintRecord) -> Result<()> {
        (**self).record(marker, record)
    }

    fn lookup(&self, scope: &Scope, kind: HintKind) -> Result<BTreeMap<QualifiedName, HintRecord>> {
        (**self).lookup(scope, kind)
    }
}
