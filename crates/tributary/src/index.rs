// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::{BTreeMap, BTreeSet};

use crate::hints::HintRecord;
use crate::model::{CompilationUnit, Declaration, QualifiedName};

/// Name-keyed view over every declaration known to one invocation.
///
/// Declarations come from the current batch of compilation units and from hint records written
/// by earlier invocations. Batch declarations always win over hinted ones with the same name.
#[derive(Debug, Clone, Default)]
pub struct DeclarationIndex {
    declarations: BTreeMap<QualifiedName, Declaration>,

    /// Supertype closures carried by hint records, for declarations whose supertypes are not
    /// themselves part of this invocation. Only hinted declarations have an entry.
    external_supertypes: BTreeMap<QualifiedName, BTreeSet<QualifiedName>>,
}

impl DeclarationIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes every declaration of the given units.
    #[must_use]
    pub fn from_units(units: &[CompilationUnit]) -> Self {
        let mut index = Self::new();
        for declaration in units.iter().flat_map(CompilationUnit::declarations) {
            index.insert(declaration.clone());
        }
        index
    }

    /// Adds a declaration unless one with the same name is already indexed.
    pub fn insert(&mut self, declaration: Declaration) {
        self.declarations.entry(declaration.name().clone()).or_insert(declaration);
    }

    /// Adds the declaration carried by a hint record together with its recorded supertype closure.
    ///
    /// Returns `false` and leaves the index untouched when the batch itself declares the name;
    /// the record is then an older snapshot of that declaration.
    pub fn insert_hint(&mut self, record: &HintRecord) -> bool {
        let name = record.declaration().name();
        if self.declares(name) {
            return false;
        }
        self.external_supertypes
            .entry(name.clone())
            .or_insert_with(|| record.supertypes().clone());
        self.insert(record.declaration().clone());
        true
    }

    /// Whether `name` is declared by the current batch rather than only known from a hint.
    #[must_use]
    pub fn declares(&self, name: &QualifiedName) -> bool {
        self.declarations.contains_key(name) && !self.external_supertypes.contains_key(name)
    }

    /// Looks a declaration up by name.
    #[must_use]
    pub fn get(&self, name: &QualifiedName) -> Option<&Declaration> {
        self.declarations.get(name)
    }

    /// Number of indexed declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Whether nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Every type `name` transitively extends or implements, not including `name` itself.
    ///
    /// Supertypes that are not indexed still appear in the result; the walk just cannot continue
    /// past them. Cycles in the supertype graph are tolerated.
    #[must_use]
    pub fn supertype_closure(&self, name: &QualifiedName) -> BTreeSet<QualifiedName> {
        let mut closure = BTreeSet::new();
        let mut pending: Vec<&QualifiedName> = self.direct_supertypes(name).collect();

        while let Some(current) = pending.pop() {
            if current == name || !closure.insert(current.clone()) {
                continue;
            }
            pending.extend(self.direct_supertypes(current));
        }

        closure
    }

    /// Whether `concrete` transitively implements `bound`.
    ///
    /// A type never implements itself for binding purposes.
    #[must_use]
    pub fn implements(&self, concrete: &QualifiedName, bound: &QualifiedName) -> bool {
        self.supertype_closure(concrete).contains(bound)
    }

    /// Packs the named declaration with its flattened supertype closure for persisting as a hint.
    #[must_use]
    pub fn hint_record(&self, name: &QualifiedName) -> Option<HintRecord> {
        let declaration = self.get(name)?.clone();
        Some(HintRecord::new(declaration, self.supertype_closure(name)))
    }

    fn direct_supertypes<'a>(&'a self, name: &QualifiedName) -> impl Iterator<Item = &'a QualifiedName> {
        let declared = self.get(name).map(Declaration::supertypes).unwrap_or_default();
        let external = self.external_supertypes.get(name).into_iter().flatten();
        declared.iter().chain(external)
    }
}
