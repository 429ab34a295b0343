// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Composition of merged artifacts and the seam to the text emitter.
//!
//! The core never formats source text. It describes the artifact as an [`ArtifactRequest`] and
//! hands it to an [`Emitter`], which returns the text to write.

use std::path::PathBuf;

use heck::ToSnakeCase;
use thiserror::Error;

use crate::config::Config;
use crate::model::{Annotation, ArgValue, QualifiedName, Scope};
use crate::resolver::{BindingDescriptor, ResolvedScope};
use crate::scanner::MergePoint;
use crate::{Error, Result};

const DOC: &str = "doc";
const ARTIFACT_EXTENSION: &str = "rs";

/// A named, typed parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: String,
    ty: QualifiedName,
}

impl Param {
    /// Creates a parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: impl Into<QualifiedName>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }

    /// The name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parameter type.
    #[must_use]
    pub const fn ty(&self) -> &QualifiedName {
        &self.ty
    }
}

/// One generated method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodStub {
    name: String,
    annotations: Vec<Annotation>,
    params: Vec<Param>,
    returns: Option<QualifiedName>,
}

impl MethodStub {
    /// Creates a method without annotations, parameters or return type.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: Vec::new(),
            params: Vec::new(),
            returns: None,
        }
    }

    /// The method that binds one resolved binding: takes the concrete type, returns the bound type.
    #[must_use]
    pub fn binding(descriptor: &BindingDescriptor) -> Self {
        Self::new(descriptor.method_name())
            .with_annotation(doc(format!(
                "Binds `{}` as `{}`.",
                descriptor.concrete(),
                descriptor.bound()
            )))
            .with_param(Param::new(descriptor.parameter_name(), descriptor.concrete()))
            .with_returns(descriptor.bound().clone())
    }

    /// Adds an annotation.
    #[must_use]
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Appends a parameter.
    #[must_use]
    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Sets the return type.
    #[must_use]
    pub fn with_returns(mut self, returns: QualifiedName) -> Self {
        self.returns = Some(returns);
        self
    }

    /// The name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Annotations, in the order they were added.
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Parameters, in order.
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// The return type, if any.
    #[must_use]
    pub const fn returns(&self) -> Option<&QualifiedName> {
        self.returns.as_ref()
    }
}

/// The structured description of one artifact handed to an [`Emitter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRequest {
    package: Option<QualifiedName>,
    class_name: String,
    base_type: Option<QualifiedName>,
    annotations: Vec<Annotation>,
    constructor_params: Vec<Param>,
    includes: Vec<QualifiedName>,
    methods: Vec<MethodStub>,
}

impl ArtifactRequest {
    /// Creates a request for an empty class.
    #[must_use]
    pub fn new(package: Option<QualifiedName>, class_name: impl Into<String>) -> Self {
        Self {
            package,
            class_name: class_name.into(),
            base_type: None,
            annotations: Vec::new(),
            constructor_params: Vec::new(),
            includes: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Sets or clears the base type.
    #[must_use]
    pub fn with_base_type(mut self, base_type: Option<QualifiedName>) -> Self {
        self.base_type = base_type;
        self
    }

    /// Adds an annotation.
    #[must_use]
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Appends a constructor parameter.
    #[must_use]
    pub fn with_constructor_param(mut self, param: Param) -> Self {
        self.constructor_params.push(param);
        self
    }

    /// Adds a merged module or interface.
    #[must_use]
    pub fn with_include(mut self, include: QualifiedName) -> Self {
        self.includes.push(include);
        self
    }

    /// Appends a method.
    #[must_use]
    pub fn with_method(mut self, method: MethodStub) -> Self {
        self.methods.push(method);
        self
    }

    /// The package the class lives in, `None` for the root package.
    #[must_use]
    pub const fn package(&self) -> Option<&QualifiedName> {
        self.package.as_ref()
    }

    /// The simple name of the generated class.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The base type, if any.
    #[must_use]
    pub const fn base_type(&self) -> Option<&QualifiedName> {
        self.base_type.as_ref()
    }

    /// Annotations, in the order they were added.
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Constructor parameters, in order.
    #[must_use]
    pub fn constructor_params(&self) -> &[Param] {
        &self.constructor_params
    }

    /// Module and interface contributions merged into the class.
    #[must_use]
    pub fn includes(&self) -> &[QualifiedName] {
        &self.includes
    }

    /// Methods, in binding order.
    #[must_use]
    pub fn methods(&self) -> &[MethodStub] {
        &self.methods
    }
}

/// Why an [`Emitter`] could not produce text.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EmitError {
    message: String,
}

impl EmitError {
    /// Creates an error with the given explanation.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Formats artifact requests as source text.
///
/// Implementations must be pure: the same request always yields the same text and nothing is
/// read from or written to the file system.
pub trait Emitter {
    /// Renders `request`.
    ///
    /// # Errors
    ///
    /// Returns an [`EmitError`] when the request cannot be expressed in the target language.
    fn emit(&self, request: &ArtifactRequest) -> std::result::Result<String, EmitError>;
}

impl<E: Emitter + ?Sized> Emitter for &E {
    fn emit(&self, request: &ArtifactRequest) -> std::result::Result<String, EmitError> {
        (**self).emit(request)
    }
}

/// A rendered artifact and where it goes, relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    merge_point: QualifiedName,
    scope: Scope,
    path: PathBuf,
    contents: String,
}

impl Artifact {
    /// The merge point the artifact was generated for.
    #[must_use]
    pub const fn merge_point(&self) -> &QualifiedName {
        &self.merge_point
    }

    /// The merged scope.
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Path relative to the output root.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// The rendered text.
    #[must_use]
    pub fn contents(&self) -> &str {
        &self.contents
    }
}

/// The generated class name for a merge point: its simple name followed by `suffix`.
#[must_use]
pub fn class_name(merge_point: &QualifiedName, suffix: &str) -> String {
    format!("{}{suffix}", merge_point.simple_name())
}

/// The output path of the artifact of `merge_point`, relative to the output root.
///
/// The package segments become directories and the class name becomes a snake-case file name,
/// so `app::di::AppComponent` with class `AppComponentMerged` lands at
/// `app/di/app_component_merged.rs`.
#[must_use]
pub fn artifact_path(merge_point: &QualifiedName, class_name: &str) -> PathBuf {
    let mut path = PathBuf::new();
    if let Some(package) = merge_point.package() {
        for segment in package.segments() {
            path.push(segment);
        }
    }
    path.push(class_name.to_snake_case());
    path.set_extension(ARTIFACT_EXTENSION);
    path
}

/// Describes the placeholder written for `merge_point` during generation: same class, no content.
#[must_use]
pub fn placeholder_request(merge_point: &MergePoint, config: &Config) -> ArtifactRequest {
    base_request(merge_point, config)
}

/// Describes the final artifact of `merge_point` from its resolved scope.
#[must_use]
pub fn artifact_request(merge_point: &MergePoint, resolved: &ResolvedScope, config: &Config) -> ArtifactRequest {
    let request = resolved
        .includes()
        .iter()
        .cloned()
        .fold(base_request(merge_point, config), ArtifactRequest::with_include);

    resolved
        .bindings()
        .iter()
        .map(MethodStub::binding)
        .fold(request, ArtifactRequest::with_method)
}

/// Renders `request` for `merge_point` with `emitter`.
///
/// # Errors
///
/// Returns [`Error::Emit`] when the emitter rejects the request.
pub fn render<E: Emitter + ?Sized>(
    emitter: &E,
    merge_point: &MergePoint,
    request: &ArtifactRequest,
) -> Result<Artifact> {
    let contents = emitter.emit(request).map_err(|e| Error::Emit {
        artifact: merge_point.declaration().clone(),
        scope: merge_point.scope().clone(),
        reason: e.to_string(),
    })?;

    Ok(Artifact {
        merge_point: merge_point.declaration().clone(),
        scope: merge_point.scope().clone(),
        path: artifact_path(merge_point.declaration(), request.class_name()),
        contents,
    })
}

fn base_request(merge_point: &MergePoint, config: &Config) -> ArtifactRequest {
    let declaration = merge_point.declaration();
    ArtifactRequest::new(declaration.package(), class_name(declaration, config.class_suffix()))
        .with_base_type(config.base_type().cloned())
        .with_annotation(doc(format!(
            "Contributions to `{}` merged for `{declaration}` ({}).",
            merge_point.scope(),
            merge_point.kind()
        )))
}

fn doc(text: String) -> Annotation {
    Annotation::new(DOC).with_arg(ArgValue::Str(text))
}
