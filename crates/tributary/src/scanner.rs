// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Extraction of contributions and merge points from declarations.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{Level, event};

use crate::config::AnnotationNames;
use crate::model::{Annotation, ArgValue, CompilationUnit, Declaration, QualifiedName, Scope};
use crate::{Error, Result};

/// Argument naming the target scope. Also accepted as the first positional argument.
pub const SCOPE_ARG: &str = "scope";

/// Argument naming the bound type of a binding. Also accepted as the second positional argument.
pub const BOUND_TYPE_ARG: &str = "bound_type";

/// Argument listing contributions that a contribution replaces.
pub const REPLACES_ARG: &str = "replaces";

/// Argument listing types a merge point excludes.
pub const EXCLUDE_ARG: &str = "exclude";

/// Argument ranking bindings of the same bound type.
pub const PRIORITY_ARG: &str = "priority";

/// The flavors of merge point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MergeKind {
    /// Merges into a component.
    Component,
    /// Merges into a subcomponent.
    Subcomponent,
    /// Merges into a plain module.
    Modules,
}

impl MergeKind {
    /// Every merge kind.
    pub const ALL: [Self; 3] = [Self::Component, Self::Subcomponent, Self::Modules];
}

impl fmt::Display for MergeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Component => "component",
            Self::Subcomponent => "subcomponent",
            Self::Modules => "modules",
        })
    }
}

/// A concrete type contributed to a scope as an implementation of `bound`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingContribution {
    concrete: QualifiedName,
    bound: QualifiedName,
    scope: Scope,
    replaces: Vec<QualifiedName>,
    priority: i64,
    file: PathBuf,
}

impl BindingContribution {
    /// The contributing type.
    #[must_use]
    pub const fn concrete(&self) -> &QualifiedName {
        &self.concrete
    }

    /// The type the contribution is bound as.
    #[must_use]
    pub const fn bound(&self) -> &QualifiedName {
        &self.bound
    }

    /// The target scope.
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Contributions this binding suppresses.
    #[must_use]
    pub fn replaces(&self) -> &[QualifiedName] {
        &self.replaces
    }

    /// Rank among bindings of the same bound type; higher wins. Defaults to zero.
    #[must_use]
    pub const fn priority(&self) -> i64 {
        self.priority
    }

    /// The file the declaration came from.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// A module or interface contributed to a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleContribution {
    name: QualifiedName,
    scope: Scope,
    replaces: Vec<QualifiedName>,
    file: PathBuf,
}

impl ModuleContribution {
    /// The contributed module or interface.
    #[must_use]
    pub const fn name(&self) -> &QualifiedName {
        &self.name
    }

    /// The target scope.
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Contributions this module suppresses. Only modules carrying the module marker have any.
    #[must_use]
    pub fn replaces(&self) -> &[QualifiedName] {
        &self.replaces
    }

    /// The file the declaration came from.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// A declaration asking for the merged artifact of a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePoint {
    declaration: QualifiedName,
    kind: MergeKind,
    scope: Scope,
    exclude: Vec<QualifiedName>,
    file: PathBuf,
}

impl MergePoint {
    /// The declaration carrying the merge annotation.
    #[must_use]
    pub const fn declaration(&self) -> &QualifiedName {
        &self.declaration
    }

    /// What kind of merge is requested.
    #[must_use]
    pub const fn kind(&self) -> MergeKind {
        self.kind
    }

    /// The target scope.
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Types omitted from the artifact however they were contributed.
    #[must_use]
    pub fn exclude(&self) -> &[QualifiedName] {
        &self.exclude
    }

    /// The file the declaration came from.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// Everything one declaration contributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationContributions {
    /// Binding contributions, one per binding annotation.
    pub bindings: Vec<BindingContribution>,
    /// Module and interface contributions, one per contribution annotation.
    pub modules: Vec<ModuleContribution>,
    /// At most one merge point.
    pub merge_point: Option<MergePoint>,
}

/// The result of scanning one batch of compilation units.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub(crate) bindings: Vec<BindingContribution>,
    pub(crate) modules: Vec<ModuleContribution>,
    pub(crate) merge_points: Vec<MergePoint>,
    pub(crate) errors: Vec<Error>,
}

impl ScanOutcome {
    /// Binding contributions, in declaration order.
    #[must_use]
    pub fn bindings(&self) -> &[BindingContribution] {
        &self.bindings
    }

    /// Module contributions, in declaration order.
    #[must_use]
    pub fn modules(&self) -> &[ModuleContribution] {
        &self.modules
    }

    /// Merge points, in declaration order.
    #[must_use]
    pub fn merge_points(&self) -> &[MergePoint] {
        &self.merge_points
    }

    /// Per-declaration failures. The contributions of a failed declaration are absent.
    #[must_use]
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }
}

/// Scans every declaration of `units`.
///
/// A declaration that fails to scan contributes nothing; its error is collected and scanning
/// continues with the next declaration.
#[must_use]
pub fn scan(units: &[CompilationUnit], names: &AnnotationNames) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();

    for declaration in units.iter().flat_map(CompilationUnit::declarations) {
        match scan_declaration(declaration, names) {
            Ok(found) => {
                for binding in &found.bindings {
                    event!(
                        Level::DEBUG,
                        binding = %binding.concrete,
                        bound = %binding.bound,
                        scope = %binding.scope,
                        "binding contribution found"
                    );
                }
                for module in &found.modules {
                    event!(Level::DEBUG, module = %module.name, scope = %module.scope, "module contribution found");
                }
                if let Some(merge_point) = &found.merge_point {
                    event!(
                        Level::DEBUG,
                        merge_point = %merge_point.declaration,
                        kind = %merge_point.kind,
                        scope = %merge_point.scope,
                        "merge point found"
                    );
                }

                outcome.bindings.extend(found.bindings);
                outcome.modules.extend(found.modules);
                outcome.merge_points.extend(found.merge_point);
            }
            Err(error) => {
                event!(Level::WARN, declaration = %declaration.name(), %error, "declaration skipped");
                outcome.errors.push(error);
            }
        }
    }

    outcome
}

/// Extracts the contributions and merge point of a single declaration.
///
/// # Errors
///
/// Returns [`Error::Resolution`] when a recognized annotation is malformed, names a type that
/// could not be resolved, or when a binding's bound type cannot be inferred.
pub fn scan_declaration(declaration: &Declaration, names: &AnnotationNames) -> Result<DeclarationContributions> {
    let reader = ArgumentReader { declaration };
    let mut found = DeclarationContributions::default();

    for annotation in declaration.annotations_named(names.contributes_binding()) {
        found.bindings.push(reader.binding(annotation)?);
    }

    let is_module = declaration.has_annotation(names.module());
    for annotation in declaration.annotations_named(names.contributes_to()) {
        found.modules.push(reader.module(annotation, is_module, names.module())?);
    }

    let mut merges = MergeKind::ALL
        .into_iter()
        .flat_map(|kind| declaration.annotations_named(names.merge(kind)).map(move |a| (kind, a)));
    if let Some((kind, annotation)) = merges.next() {
        if merges.next().is_some() {
            return Err(reader.error("carries more than one merge annotation"));
        }
        found.merge_point = Some(reader.merge_point(kind, annotation)?);
    }

    Ok(found)
}

/// Reads annotation arguments of one declaration, attributing failures to it.
struct ArgumentReader<'a> {
    declaration: &'a Declaration,
}

impl ArgumentReader<'_> {
    fn binding(&self, annotation: &Annotation) -> Result<BindingContribution> {
        let declaration = self.declaration;
        if !declaration.kind().is_concrete() {
            return Err(self.error(format!(
                "`#[{}]` requires a struct or enum, found {:?}",
                annotation.name(),
                declaration.kind()
            )));
        }

        let scope = self.scope(annotation)?;
        let bound = match annotation.argument(BOUND_TYPE_ARG, Some(1)) {
            Some(value) => self.single_type(annotation, BOUND_TYPE_ARG, value)?,
            None => self.inferred_bound(annotation)?,
        };

        Ok(BindingContribution {
            concrete: declaration.name().clone(),
            bound,
            scope,
            replaces: self.type_list(annotation, REPLACES_ARG)?,
            priority: self.priority(annotation)?,
            file: declaration.file().to_path_buf(),
        })
    }

    fn module(&self, annotation: &Annotation, is_module: bool, module_marker: &str) -> Result<ModuleContribution> {
        let replaces = self.type_list(annotation, REPLACES_ARG)?;
        if !replaces.is_empty() && !is_module {
            return Err(self.error(format!(
                "`{REPLACES_ARG}` on `#[{}]` is only allowed together with `#[{module_marker}]`",
                annotation.name()
            )));
        }

        Ok(ModuleContribution {
            name: self.declaration.name().clone(),
            scope: self.scope(annotation)?,
            replaces,
            file: self.declaration.file().to_path_buf(),
        })
    }

    fn merge_point(&self, kind: MergeKind, annotation: &Annotation) -> Result<MergePoint> {
        Ok(MergePoint {
            declaration: self.declaration.name().clone(),
            kind,
            scope: self.scope(annotation)?,
            exclude: self.type_list(annotation, EXCLUDE_ARG)?,
            file: self.declaration.file().to_path_buf(),
        })
    }

    fn scope(&self, annotation: &Annotation) -> Result<Scope> {
        let value = annotation
            .argument(SCOPE_ARG, Some(0))
            .ok_or_else(|| self.error(format!("`#[{}]` is missing its `{SCOPE_ARG}` argument", annotation.name())))?;
        self.single_type(annotation, SCOPE_ARG, value).map(Scope::new)
    }

    fn inferred_bound(&self, annotation: &Annotation) -> Result<QualifiedName> {
        match self.declaration.supertypes() {
            [single] => Ok(single.clone()),
            [] => Err(self.error(format!(
                "`#[{}]` has no `{BOUND_TYPE_ARG}` and the type has no supertype to bind to",
                annotation.name()
            ))),
            several => {
                let listed = several.iter().map(QualifiedName::as_str).collect::<Vec<_>>().join(", ");
                Err(self.error(format!(
                    "`#[{}]` has no `{BOUND_TYPE_ARG}` and the type has {} supertypes ({listed}); name one explicitly",
                    annotation.name(),
                    several.len()
                )))
            }
        }
    }

    fn single_type(&self, annotation: &Annotation, arg: &str, value: &ArgValue) -> Result<QualifiedName> {
        match value {
            ArgValue::Type(name) => Ok(name.clone()),
            ArgValue::Unresolved(text) => Err(self.unresolved(annotation, arg, text)),
            _ => Err(self.error(format!("`{arg}` of `#[{}]` must be exactly one type", annotation.name()))),
        }
    }

    fn type_list(&self, annotation: &Annotation, arg: &str) -> Result<Vec<QualifiedName>> {
        match annotation.argument(arg, None) {
            None => Ok(Vec::new()),
            Some(ArgValue::Array(items)) => items
                .iter()
                .map(|item| match item {
                    ArgValue::Type(name) => Ok(name.clone()),
                    ArgValue::Unresolved(text) => Err(self.unresolved(annotation, arg, text)),
                    _ => Err(self.error(format!("`{arg}` of `#[{}]` may only list types", annotation.name()))),
                })
                .collect(),
            Some(_) => Err(self.error(format!("`{arg}` of `#[{}]` must be an array of types", annotation.name()))),
        }
    }

    fn priority(&self, annotation: &Annotation) -> Result<i64> {
        match annotation.argument(PRIORITY_ARG, None) {
            None => Ok(0),
            Some(ArgValue::Int(priority)) => Ok(*priority),
            Some(_) => Err(self.error(format!("`{PRIORITY_ARG}` of `#[{}]` must be an integer", annotation.name()))),
        }
    }

    fn unresolved(&self, annotation: &Annotation, arg: &str, text: &str) -> Error {
        self.error(format!("cannot resolve `{text}` in `{arg}` of `#[{}]`", annotation.name()))
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        Error::resolution(self.declaration.name(), self.declaration.file(), reason)
    }
}
