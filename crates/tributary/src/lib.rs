// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Contribution merging for build-time dependency-injection wiring.
//!
//! Declarations scattered across many independently compiled source files *contribute* bindings,
//! modules or interfaces to a named [`Scope`]. A *merge point* asks for every contribution of a
//! scope to be materialized as one generated artifact with a method per contributed binding.
//!
//! This crate is the engine behind that model:
//!
//! - [`scanner`] walks the [`Declaration`]s of one invocation and extracts binding contributions,
//!   module contributions and merge points.
//! - [`hints`] persists one marker per contribution so that later invocations, including ones
//!   compiling a different crate, discover contributions they cannot see directly.
//! - [`resolver`] applies `replaces` and `exclude` directives, validates that every binding
//!   implements the type it claims to bind, and produces a deterministically ordered binding list.
//! - [`emit`] turns a resolved scope into an [`ArtifactRequest`] for an external [`Emitter`].
//! - [`Pipeline`] drives all of the above in two phases, `generate` and `flush`.
//!
//! Source parsing and text formatting are not part of this crate. They are supplied through the
//! [`DeclarationSource`] and [`Emitter`] traits.
//!
//! # Example
//!
//! ```
//! use tributary::emit::{ArtifactRequest, EmitError, Emitter};
//! use tributary::hints::MemoryHintStore;
//! use tributary::output::MemoryOutput;
//! use tributary::{Annotation, ArgValue, CompilationUnit, Config, Declaration, DeclarationKind, Pipeline};
//!
//! struct Names;
//!
//! impl Emitter for Names {
//!     fn emit(&self, request: &ArtifactRequest) -> Result<String, EmitError> {
//!         let methods: Vec<_> = request.methods().iter().map(|m| m.name().to_owned()).collect();
//!         Ok(methods.join("\n"))
//!     }
//! }
//!
//! let unit = CompilationUnit::new("app.rs")
//!     .with_declaration(
//!         Declaration::new("app::Impl1", DeclarationKind::Struct)
//!             .with_supertype("app::Api")
//!             .with_annotation(Annotation::new("contributes_binding").with_arg(ArgValue::ty("app::AppScope"))),
//!     )
//!     .with_declaration(
//!         Declaration::new("app::AppComponent", DeclarationKind::Trait)
//!             .with_annotation(Annotation::new("merge_component").with_arg(ArgValue::ty("app::AppScope"))),
//!     );
//!
//! let mut pipeline = Pipeline::new(Config::default(), MemoryHintStore::new(), Names);
//! let mut output = MemoryOutput::new();
//! let report = pipeline.run(&[unit], &mut output).unwrap();
//!
//! assert!(report.errors().is_empty());
//! assert_eq!(output.get("app/app_component_merged.rs"), Some("bind_app_impl1"));
//! ```

mod config;
mod error;
mod index;
mod model;
mod pipeline;

pub mod emit;
pub mod hints;
pub mod output;
pub mod resolver;
pub mod scanner;

pub use config::{AnnotationNames, Config};
pub use error::{Error, Result};
pub use index::DeclarationIndex;
pub use model::{
    Annotation, AnnotationArg, ArgValue, CompilationUnit, Declaration, DeclarationKind, DeclarationSource, QualifiedName, Scope,
};
pub use pipeline::{FlushReport, Generated, Pipeline};

#[doc(inline)]
pub use emit::{ArtifactRequest, Emitter};
