// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Rust front end for [`tributary`] contribution merging.
//!
//! This crate reads the sources of a crate with `syn`, hands them to the
//! [`tributary::Pipeline`] and writes the merged wiring as Rust files into `OUT_DIR`. It is meant
//! to run from a build script:
//!
//! ```no_run
//! // build.rs
//! fn main() -> Result<(), tributary_rust::BuildError> {
//!     tributary_rust::Builder::from_env()?.run()?;
//!     Ok(())
//! }
//! ```
//!
//! Contributions are written with the marker attributes of `tributary_macros`:
//!
//! ```ignore
//! use tributary_macros::{contributes_binding, merge_component};
//!
//! pub struct AppScope;
//!
//! pub trait Api {}
//!
//! #[contributes_binding(AppScope)]
//! pub struct Impl1;
//!
//! impl Api for Impl1 {}
//!
//! #[merge_component(AppScope)]
//! pub trait AppComponent {}
//!
//! include!(concat!(env!("OUT_DIR"), "/generated/app/app_component_merged.rs"));
//! ```
//!
//! The generated `AppComponentMerged` struct then has a `bind_app_impl1(impl1: Impl1)` function
//! returning `Box<dyn Api>`. See [`RustEmitter`] for the exact shape of generated code and
//! [`source`] for how declarations, supertypes and attribute arguments are read.

mod builder;
mod emitter;
pub mod source;

pub use builder::{BuildError, Builder, HINT_DIR_ENV};
pub use emitter::RustEmitter;
pub use source::{SourceError, SourceTree};
