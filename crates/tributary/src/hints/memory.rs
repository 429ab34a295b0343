// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;

use super::{HintKind, HintMarker, HintRecord, HintStore};
use crate::Result;
use crate::model::{QualifiedName, Scope};

/// A hint store that lives as long as the process.
///
/// Useful for hosts that run several invocations in one process and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryHintStore {
    records: BTreeMap<(HintKind, Scope), BTreeMap<QualifiedName, HintRecord>>,
}

impl MemoryHintStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of recorded markers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.values().map(BTreeMap::len).sum()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HintStore for MemoryHintStore {
    fn record(&mut self, marker: &HintMarker, record: &HintRecord) -> Result<()> {
        self.records
            .entry((marker.kind(), marker.scope().clone()))
            .or_default()
            .entry(marker.name().clone())
            .or_insert_with(|| record.clone());
        Ok(())
    }

    fn lookup(&self, scope: &Scope, kind: HintKind) -> Result<BTreeMap<QualifiedName, HintRecord>> {
        Ok(self.records.get(&(kind, scope.clone())).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::model::{Declaration, DeclarationKind};

    fn record(name: &str) -> HintRecord {
        HintRecord::new(Declaration::new(name, DeclarationKind::Struct), BTreeSet::new())
    }

    #[test]
    fn recording_twice_is_idempotent() {
        let mut store = MemoryHintStore::new();
        let marker = HintMarker::new(HintKind::Binding, Scope::new("app::AppScope"), "app::Impl1".into());

        store.record(&marker, &record("app::Impl1")).unwrap();
        store.record(&marker, &record("app::Impl1")).unwrap();

        assert_eq!(store.len(), 1);
        let found = store.lookup(&Scope::new("app::AppScope"), HintKind::Binding).unwrap();
        assert_eq!(found.keys().collect::<Vec<_>>(), [&QualifiedName::new("app::Impl1")]);
    }

    #[test]
    fn lookup_is_partitioned_by_kind_and_scope() {
        let mut store = MemoryHintStore::new();
        let scope = Scope::new("app::AppScope");
        store
            .record(&HintMarker::new(HintKind::Binding, scope.clone(), "app::Impl1".into()), &record("app::Impl1"))
            .unwrap();

        assert!(store.lookup(&scope, HintKind::Contribution).unwrap().is_empty());
        assert!(store.lookup(&Scope::new("app::Other"), HintKind::Binding).unwrap().is_empty());
    }
}
