// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The merge resolver: turns the contributions of one scope into an ordered binding list.

use std::collections::{BTreeMap, BTreeSet};

use heck::ToSnakeCase;
use tracing::{Level, event};

use crate::index::DeclarationIndex;
use crate::model::{QualifiedName, Scope};
use crate::scanner::{BindingContribution, ModuleContribution};
use crate::{Error, Result};

const METHOD_PREFIX: &str = "bind";

/// Every contribution known for one scope, gathered from the current batch and from hints.
///
/// Contributions are deduplicated by name: the first one added for a given name is kept. The
/// pipeline adds batch contributions before hinted ones, so the current sources win.
#[derive(Debug, Clone, Default)]
pub struct ScopeContributions {
    bindings: BTreeMap<QualifiedName, BindingContribution>,
    modules: BTreeMap<QualifiedName, ModuleContribution>,
    excluded: BTreeSet<QualifiedName>,
}

impl ScopeContributions {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a binding unless one with the same concrete type is present. Returns whether it was added.
    pub fn add_binding(&mut self, binding: BindingContribution) -> bool {
        let mut added = false;
        self.bindings.entry(binding.concrete().clone()).or_insert_with(|| {
            added = true;
            binding
        });
        added
    }

    /// Adds a module unless one with the same name is present. Returns whether it was added.
    pub fn add_module(&mut self, module: ModuleContribution) -> bool {
        let mut added = false;
        self.modules.entry(module.name().clone()).or_insert_with(|| {
            added = true;
            module
        });
        added
    }

    /// Adds types that a merge point of this scope excludes.
    pub fn exclude<I>(&mut self, names: I)
    where
        I: IntoIterator<Item = QualifiedName>,
    {
        self.excluded.extend(names);
    }

    /// Candidate bindings keyed by concrete type.
    #[must_use]
    pub const fn bindings(&self) -> &BTreeMap<QualifiedName, BindingContribution> {
        &self.bindings
    }

    /// Candidate modules keyed by name.
    #[must_use]
    pub const fn modules(&self) -> &BTreeMap<QualifiedName, ModuleContribution> {
        &self.modules
    }

    /// The scope-level exclude set.
    #[must_use]
    pub const fn excluded(&self) -> &BTreeSet<QualifiedName> {
        &self.excluded
    }

    /// Union of every `replaces` list carried by a candidate binding or module.
    #[must_use]
    pub fn replaced(&self) -> BTreeSet<QualifiedName> {
        let from_bindings = self.bindings.values().flat_map(BindingContribution::replaces);
        let from_modules = self.modules.values().flat_map(ModuleContribution::replaces);
        from_bindings.chain(from_modules).cloned().collect()
    }
}

/// One binding that survived resolution, ready to become a generated method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingDescriptor {
    concrete: QualifiedName,
    bound: QualifiedName,
    method_name: String,
    parameter_name: String,
    priority: i64,
}

impl BindingDescriptor {
    fn new(binding: &BindingContribution) -> Self {
        Self {
            concrete: binding.concrete().clone(),
            bound: binding.bound().clone(),
            method_name: method_name(binding.concrete()),
            parameter_name: parameter_name(binding.concrete()),
            priority: binding.priority(),
        }
    }

    /// The concrete type.
    #[must_use]
    pub const fn concrete(&self) -> &QualifiedName {
        &self.concrete
    }

    /// The bound type.
    #[must_use]
    pub const fn bound(&self) -> &QualifiedName {
        &self.bound
    }

    /// Name of the generated method, unique per concrete type.
    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Name of the generated method's single parameter.
    #[must_use]
    pub fn parameter_name(&self) -> &str {
        &self.parameter_name
    }

    /// The binding priority.
    #[must_use]
    pub const fn priority(&self) -> i64 {
        self.priority
    }
}

/// The final content of a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScope {
    scope: Scope,
    bindings: Vec<BindingDescriptor>,
    includes: Vec<QualifiedName>,
}

impl ResolvedScope {
    /// The resolved scope.
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Surviving bindings sorted by concrete type name.
    #[must_use]
    pub fn bindings(&self) -> &[BindingDescriptor] {
        &self.bindings
    }

    /// Surviving module and interface contributions sorted by name.
    #[must_use]
    pub fn includes(&self) -> &[QualifiedName] {
        &self.includes
    }
}

/// Resolves the final content of `scope`.
///
/// Candidates named by any `replaces` list or by the scope's exclude set are dropped. Every
/// remaining binding must implement its bound type according to `index`. Among bindings of the
/// same bound type only those with the highest priority are kept. The result does not depend on
/// the order in which contributions were added.
///
/// # Errors
///
/// Returns [`Error::BindingContract`] for the first surviving binding, in name order, whose
/// concrete type does not implement its bound type.
pub fn resolve(scope: &Scope, contributions: &ScopeContributions, index: &DeclarationIndex) -> Result<ResolvedScope> {
    let replaced = contributions.replaced();
    let excluded = contributions.excluded();
    let keep = |name: &QualifiedName| {
        let suppressed = replaced.contains(name) || excluded.contains(name);
        if suppressed {
            event!(Level::DEBUG, %scope, contribution = %name, "contribution suppressed");
        }
        !suppressed
    };

    for name in excluded {
        if !contributions.bindings().contains_key(name) && !contributions.modules().contains_key(name) {
            event!(Level::DEBUG, %scope, excluded = %name, "excluded type matches no contribution");
        }
    }

    let survivors: Vec<&BindingContribution> = contributions
        .bindings()
        .values()
        .filter(|binding| keep(binding.concrete()))
        .collect();

    for binding in &survivors {
        if !index.implements(binding.concrete(), binding.bound()) {
            return Err(Error::BindingContract {
                concrete: binding.concrete().clone(),
                bound: binding.bound().clone(),
                scope: scope.clone(),
                file: binding.file().to_path_buf(),
            });
        }
    }

    let mut top_priority: BTreeMap<&QualifiedName, i64> = BTreeMap::new();
    for binding in &survivors {
        top_priority
            .entry(binding.bound())
            .and_modify(|top| *top = (*top).max(binding.priority()))
            .or_insert(binding.priority());
    }

    let bindings: Vec<BindingDescriptor> = survivors
        .into_iter()
        .filter(|binding| top_priority.get(binding.bound()) == Some(&binding.priority()))
        .map(BindingDescriptor::new)
        .collect();

    let includes: Vec<QualifiedName> = contributions
        .modules()
        .keys()
        .filter(|name| keep(name))
        .cloned()
        .collect();

    event!(
        Level::DEBUG,
        %scope,
        bindings = bindings.len(),
        includes = includes.len(),
        "scope resolved"
    );

    Ok(ResolvedScope {
        scope: scope.clone(),
        bindings,
        includes,
    })
}

/// The generated method name for a concrete type: `bind_` followed by every path segment in snake case.
#[must_use]
pub fn method_name(concrete: &QualifiedName) -> String {
    let mut name = String::from(METHOD_PREFIX);
    for segment in concrete.segments() {
        name.push('_');
        name.push_str(&segment.to_snake_case());
    }
    name
}

/// The generated parameter name for a concrete type: its simple name in snake case.
#[must_use]
pub fn parameter_name(concrete: &QualifiedName) -> String {
    concrete.simple_name().to_snake_case()
}
