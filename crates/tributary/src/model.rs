// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::convert::Infallible;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const SEPARATOR: &str = "::";

/// A fully-qualified, `::`-separated type name.
///
/// Equality and ordering are structural: two names are equal when their text is equal and they
/// order lexicographically by bytes. That ordering is what makes generated artifacts stable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualifiedName(String);

impl QualifiedName {
    /// Creates a name from its `::`-separated text.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Creates a name by joining the given segments with `::`.
    #[must_use]
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path = String::new();
        for segment in segments {
            if !path.is_empty() {
                path.push_str(SEPARATOR);
            }
            path.push_str(segment.as_ref());
        }
        Self(path)
    }

    /// The name as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the `::`-separated segments of the name.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR)
    }

    /// The last segment of the name.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.0.rsplit_once(SEPARATOR).map_or(self.0.as_str(), |(_, simple)| simple)
    }

    /// Everything but the last segment, or `None` for a single-segment name.
    #[must_use]
    pub fn package(&self) -> Option<Self> {
        self.0.rsplit_once(SEPARATOR).map(|(package, _)| Self(package.to_owned()))
    }

    /// Appends one segment.
    #[must_use]
    pub fn join(&self, segment: &str) -> Self {
        if self.0.is_empty() {
            return Self(segment.to_owned());
        }
        Self(format!("{}{SEPARATOR}{segment}", self.0))
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QualifiedName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for QualifiedName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&Self> for QualifiedName {
    fn from(value: &Self) -> Self {
        value.clone()
    }
}

/// An opaque key that partitions contributions and merge points.
///
/// A scope is named by a type but that type is never instantiated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(QualifiedName);

impl Scope {
    /// Creates a scope keyed by the given type name.
    #[must_use]
    pub fn new(name: impl Into<QualifiedName>) -> Self {
        Self(name.into())
    }

    /// The type name that keys this scope.
    #[must_use]
    pub const fn name(&self) -> &QualifiedName {
        &self.0
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<QualifiedName> for Scope {
    fn from(value: QualifiedName) -> Self {
        Self(value)
    }
}

/// What sort of type a [`Declaration`] introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DeclarationKind {
    /// A concrete record type.
    Struct,
    /// A concrete sum type.
    Enum,
    /// An interface. Traits can be bound to but never be a binding's concrete type.
    Trait,
    /// Anything else the declaration source chooses to report.
    Other,
}

impl DeclarationKind {
    /// Whether values of this kind can be constructed and therefore bound.
    #[must_use]
    pub const fn is_concrete(self) -> bool {
        matches!(self, Self::Struct | Self::Enum)
    }
}

/// The value of one annotation argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ArgValue {
    /// A class literal, already resolved to a qualified name.
    Type(QualifiedName),
    /// An array of values.
    Array(Vec<Self>),
    /// A string literal.
    Str(String),
    /// A boolean literal.
    Bool(bool),
    /// An integer literal.
    Int(i64),
    /// A reference the declaration source could not resolve, kept as source text.
    Unresolved(String),
}

impl ArgValue {
    /// Shorthand for [`ArgValue::Type`].
    #[must_use]
    pub fn ty(name: impl Into<QualifiedName>) -> Self {
        Self::Type(name.into())
    }

    /// Shorthand for an array of [`ArgValue::Type`] values.
    #[must_use]
    pub fn types<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<QualifiedName>,
    {
        Self::Array(names.into_iter().map(Self::ty).collect())
    }
}

/// One argument of an [`Annotation`], positional when `name` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationArg {
    name: Option<String>,
    value: ArgValue,
}

impl AnnotationArg {
    /// The argument name, `None` for positional arguments.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The argument value.
    #[must_use]
    pub const fn value(&self) -> &ArgValue {
        &self.value
    }
}

/// An annotation (attribute) attached to a declaration, together with its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    name: QualifiedName,
    args: Vec<AnnotationArg>,
}

impl Annotation {
    /// Creates an annotation without arguments.
    #[must_use]
    pub fn new(name: impl Into<QualifiedName>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn with_arg(mut self, value: ArgValue) -> Self {
        self.args.push(AnnotationArg { name: None, value });
        self
    }

    /// Appends a named argument.
    #[must_use]
    pub fn with_named_arg(mut self, name: impl Into<String>, value: ArgValue) -> Self {
        self.args.push(AnnotationArg {
            name: Some(name.into()),
            value,
        });
        self
    }

    /// The annotation name as written by the declaration source, possibly qualified.
    #[must_use]
    pub const fn name(&self) -> &QualifiedName {
        &self.name
    }

    /// All arguments in source order.
    #[must_use]
    pub fn args(&self) -> &[AnnotationArg] {
        &self.args
    }

    /// Looks an argument up by name, falling back to the positional argument at `position`.
    ///
    /// Named arguments win: `#[a(X, scope = Y)]` yields `Y` for `argument("scope", Some(0))`.
    #[must_use]
    pub fn argument(&self, name: &str, position: Option<usize>) -> Option<&ArgValue> {
        if let Some(named) = self.args.iter().find(|arg| arg.name() == Some(name)) {
            return Some(&named.value);
        }

        let position = position?;
        self.args
            .iter()
            .filter(|arg| arg.name.is_none())
            .nth(position)
            .map(|arg| &arg.value)
    }
}

/// A named type declaration as reported by a [`DeclarationSource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    name: QualifiedName,
    kind: DeclarationKind,
    annotations: Vec<Annotation>,
    supertypes: Vec<QualifiedName>,
    file: PathBuf,
}

impl Declaration {
    /// Creates a declaration without annotations or supertypes.
    #[must_use]
    pub fn new(name: impl Into<QualifiedName>, kind: DeclarationKind) -> Self {
        Self {
            name: name.into(),
            kind,
            annotations: Vec::new(),
            supertypes: Vec::new(),
            file: PathBuf::new(),
        }
    }

    /// Attaches an annotation.
    #[must_use]
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Adds a direct supertype. Duplicates are ignored.
    #[must_use]
    pub fn with_supertype(mut self, supertype: impl Into<QualifiedName>) -> Self {
        self.add_supertype(supertype.into());
        self
    }

    /// Sets the file the declaration originates from.
    #[must_use]
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = file.into();
        self
    }

    /// Adds a direct supertype in place. Duplicates are ignored.
    pub fn add_supertype(&mut self, supertype: QualifiedName) {
        if !self.supertypes.contains(&supertype) {
            self.supertypes.push(supertype);
        }
    }

    /// The fully-qualified name.
    #[must_use]
    pub const fn name(&self) -> &QualifiedName {
        &self.name
    }

    /// The declaration kind.
    #[must_use]
    pub const fn kind(&self) -> DeclarationKind {
        self.kind
    }

    /// All annotations in source order.
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Annotations whose simple name is `simple_name`.
    pub fn annotations_named<'a>(&'a self, simple_name: &'a str) -> impl Iterator<Item = &'a Annotation> {
        self.annotations
            .iter()
            .filter(move |annotation| annotation.name.simple_name() == simple_name)
    }

    /// Whether at least one annotation has the simple name `simple_name`.
    #[must_use]
    pub fn has_annotation(&self, simple_name: &str) -> bool {
        self.annotations_named(simple_name).next().is_some()
    }

    /// Direct supertypes in declaration order.
    #[must_use]
    pub fn supertypes(&self) -> &[QualifiedName] {
        &self.supertypes
    }

    /// The originating file.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// The declarations of one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationUnit {
    file: PathBuf,
    declarations: Vec<Declaration>,
}

impl CompilationUnit {
    /// Creates an empty unit for `file`.
    #[must_use]
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            declarations: Vec::new(),
        }
    }

    /// Adds a declaration, stamping it with this unit's file when it has none.
    #[must_use]
    pub fn with_declaration(mut self, declaration: Declaration) -> Self {
        self.push(declaration);
        self
    }

    /// Adds a declaration in place, stamping it with this unit's file when it has none.
    pub fn push(&mut self, mut declaration: Declaration) {
        if declaration.file.as_os_str().is_empty() {
            declaration.file.clone_from(&self.file);
        }
        self.declarations.push(declaration);
    }

    /// The source file.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// The declarations in source order.
    #[must_use]
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }
}

/// Produces the compilation units of one invocation.
///
/// Implementations parse sources and resolve names. Class literals in annotation arguments must
/// be reported as [`ArgValue::Type`] when they resolve and as [`ArgValue::Unresolved`] when they
/// do not; the scanner turns the latter into resolution errors where the value is needed.
pub trait DeclarationSource {
    /// The error raised when sources cannot be read or parsed.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns every compilation unit of the invocation.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying sources cannot be read or parsed.
    fn compilation_units(&self) -> Result<Vec<CompilationUnit>, Self::Error>;
}

impl DeclarationSource for [CompilationUnit] {
    type Error = Infallible;

    fn compilation_units(&self) -> Result<Vec<CompilationUnit>, Self::Error> {
        Ok(self.to_vec())
    }
}

impl DeclarationSource for Vec<CompilationUnit> {
    type Error = Infallible;

    fn compilation_units(&self) -> Result<Vec<CompilationUnit>, Self::Error> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_name_parts() {
        let name = QualifiedName::new("app::di::Impl1");

        assert_eq!(name.simple_name(), "Impl1");
        assert_eq!(name.package(), Some(QualifiedName::new("app::di")));
        assert_eq!(name.segments().collect::<Vec<_>>(), ["app", "di", "Impl1"]);
        assert_eq!(QualifiedName::new("Impl1").package(), None);
        assert_eq!(QualifiedName::new("Impl1").simple_name(), "Impl1");
    }

    #[test]
    fn qualified_name_join_and_segments() {
        let joined = QualifiedName::new("app").join("Impl1");
        assert_eq!(joined, QualifiedName::from_segments(["app", "Impl1"]));
        assert_eq!(QualifiedName::new("").join("Impl1").as_str(), "Impl1");
    }

    #[test]
    fn names_order_by_bytes() {
        let mut names = vec![
            QualifiedName::new("b::A"),
            QualifiedName::new("a::b"),
            QualifiedName::new("a::B"),
        ];
        names.sort();

        assert_eq!(names, ["a::B", "a::b", "b::A"].map(QualifiedName::new));
    }

    #[test]
    fn argument_lookup_prefers_named() {
        let annotation = Annotation::new("merge_component")
            .with_arg(ArgValue::ty("app::Positional"))
            .with_named_arg("scope", ArgValue::ty("app::Named"));

        assert_eq!(annotation.argument("scope", Some(0)), Some(&ArgValue::ty("app::Named")));
        assert_eq!(annotation.argument("exclude", Some(0)), Some(&ArgValue::ty("app::Positional")));
        assert_eq!(annotation.argument("exclude", None), None);
    }

    #[test]
    fn positional_index_skips_named_arguments() {
        let annotation = Annotation::new("a")
            .with_named_arg("x", ArgValue::Bool(true))
            .with_arg(ArgValue::Int(7));

        assert_eq!(annotation.argument("scope", Some(0)), Some(&ArgValue::Int(7)));
        assert_eq!(annotation.argument("scope", Some(1)), None);
    }

    #[test]
    fn declaration_matches_annotations_by_simple_name() {
        let declaration = Declaration::new("app::Impl1", DeclarationKind::Struct)
            .with_annotation(Annotation::new("tributary::contributes_binding"))
            .with_supertype("app::Api")
            .with_supertype("app::Api");

        assert!(declaration.has_annotation("contributes_binding"));
        assert!(!declaration.has_annotation("tributary"));
        assert_eq!(declaration.supertypes(), [QualifiedName::new("app::Api")]);
    }

    #[test]
    fn unit_stamps_file_on_declarations() {
        let unit = CompilationUnit::new("src/app.rs")
            .with_declaration(Declaration::new("app::A", DeclarationKind::Struct))
            .with_declaration(Declaration::new("app::B", DeclarationKind::Struct).with_file("elsewhere.rs"));

        assert_eq!(unit.declarations()[0].file(), Path::new("src/app.rs"));
        assert_eq!(unit.declarations()[1].file(), Path::new("elsewhere.rs"));
    }

    #[test]
    fn vec_is_a_declaration_source() {
        let units = vec![CompilationUnit::new("a.rs")];
        assert_eq!(units.compilation_units().unwrap(), units);
    }
}
