// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::model::QualifiedName;
use crate::scanner::MergeKind;

/// The annotation vocabulary recognized by the scanner.
///
/// Annotations are matched by their simple (last segment) name, so both `contributes_binding` and
/// `tributary::contributes_binding` match the default vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationNames {
    contributes_binding: String,
    contributes_to: String,
    module: String,
    merge_component: String,
    merge_subcomponent: String,
    merge_modules: String,
}

impl Default for AnnotationNames {
    fn default() -> Self {
        Self {
            contributes_binding: "contributes_binding".to_owned(),
            contributes_to: "contributes_to".to_owned(),
            module: "module".to_owned(),
            merge_component: "merge_component".to_owned(),
            merge_subcomponent: "merge_subcomponent".to_owned(),
            merge_modules: "merge_modules".to_owned(),
        }
    }
}

impl AnnotationNames {
    /// Overrides the name of the binding contribution annotation.
    #[must_use]
    pub fn with_contributes_binding(mut self, name: impl Into<String>) -> Self {
        self.contributes_binding = name.into();
        self
    }

    /// Overrides the name of the module/interface contribution annotation.
    #[must_use]
    pub fn with_contributes_to(mut self, name: impl Into<String>) -> Self {
        self.contributes_to = name.into();
        self
    }

    /// Overrides the name of the module marker annotation.
    #[must_use]
    pub fn with_module(mut self, name: impl Into<String>) -> Self {
        self.module = name.into();
        self
    }

    /// Overrides the name of one merge annotation.
    #[must_use]
    pub fn with_merge(mut self, kind: MergeKind, name: impl Into<String>) -> Self {
        let name = name.into();
        match kind {
            MergeKind::Component => self.merge_component = name,
            MergeKind::Subcomponent => self.merge_subcomponent = name,
            MergeKind::Modules => self.merge_modules = name,
        }
        self
    }

    /// Simple name of the binding contribution annotation.
    #[must_use]
    pub fn contributes_binding(&self) -> &str {
        &self.contributes_binding
    }

    /// Simple name of the module contribution annotation.
    #[must_use]
    pub fn contributes_to(&self) -> &str {
        &self.contributes_to
    }

    /// Simple name of the module marker annotation.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The annotation name used for merge points of the given kind.
    #[must_use]
    pub fn merge(&self, kind: MergeKind) -> &str {
        match kind {
            MergeKind::Component => &self.merge_component,
            MergeKind::Subcomponent => &self.merge_subcomponent,
            MergeKind::Modules => &self.merge_modules,
        }
    }
}

/// Settings shared by every phase of a [`Pipeline`](crate::Pipeline).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    annotations: AnnotationNames,
    class_suffix: String,
    base_type: Option<QualifiedName>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            annotations: AnnotationNames::default(),
            class_suffix: "Merged".to_owned(),
            base_type: None,
        }
    }
}

impl Config {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the annotation vocabulary.
    #[must_use]
    pub fn with_annotations(mut self, annotations: AnnotationNames) -> Self {
        self.annotations = annotations;
        self
    }

    /// Sets the suffix appended to a merge point's simple name to form the generated class name.
    #[must_use]
    pub fn with_class_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.class_suffix = suffix.into();
        self
    }

    /// Sets a type every generated artifact declares as its base.
    #[must_use]
    pub fn with_base_type(mut self, base_type: impl Into<QualifiedName>) -> Self {
        self.base_type = Some(base_type.into());
        self
    }

    /// The annotation vocabulary.
    #[must_use]
    pub const fn annotations(&self) -> &AnnotationNames {
        &self.annotations
    }

    /// The class name suffix.
    #[must_use]
    pub fn class_suffix(&self) -> &str {
        &self.class_suffix
    }

    /// The base type of generated artifacts, if any.
    #[must_use]
    pub const fn base_type(&self) -> Option<&QualifiedName> {
        self.base_type.as_ref()
    }
}
