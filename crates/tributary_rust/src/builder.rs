// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::env::{self, VarError};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{Level, event};
use tributary::hints::DirHintStore;
use tributary::output::OutputDir;
use tributary::{Config, DeclarationSource, FlushReport, Pipeline};

use crate::emitter::RustEmitter;
use crate::source::{SourceError, SourceTree};

/// Environment variable naming a hint directory shared by several crates.
pub const HINT_DIR_ENV: &str = "TRIBUTARY_HINT_DIR";

const GENERATED_DIR: &str = "generated";
const DEFAULT_HINT_DIR: &str = "tributary-hints";

/// Errors that stop a build script invocation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuildError {
    /// A variable Cargo sets for build scripts is missing or not Unicode.
    #[error("cannot read environment variable {name}")]
    Env {
        /// The variable.
        name: &'static str,
        /// The underlying error.
        #[source]
        source: VarError,
    },

    /// The crate's sources could not be loaded.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The invocation failed fatally while recording hints or writing artifacts.
    #[error(transparent)]
    Invocation(#[from] tributary::Error),

    /// Some contributions or merge points could not be merged.
    ///
    /// Every scope was still flushed, so the report lists all failures of the invocation. Scopes
    /// that failed keep their placeholder artifacts.
    #[error("{} contribution(s) could not be merged, first: {}", .report.errors().len(), first_error(.report))]
    Unmerged {
        /// The outcome of the flush.
        report: Box<FlushReport>,
    },
}

/// Runs contribution merging for one crate from its build script.
///
/// Sources are read from `src_dir`, hints are shared through `hint_dir` and generated files land
/// in `<out_dir>/generated`, mirroring the module path of each merge point. A merge point
/// `app::di::AppComponent` in crate `app` is pulled in with:
///
/// ```ignore
/// include!(concat!(env!("OUT_DIR"), "/generated/app/di/app_component_merged.rs"));
/// ```
///
/// Crates that contribute to each other's scopes must point `hint_dir` at the same directory,
/// for example by setting [`HINT_DIR_ENV`] for the whole workspace build. Contributions from a
/// crate are only visible to crates built after it, so the crate holding the merge point should
/// depend on the contributing crates.
#[derive(Debug, Clone)]
pub struct Builder {
    crate_name: String,
    src_dir: PathBuf,
    out_dir: PathBuf,
    hint_dir: PathBuf,
    config: Config,
    cargo_directives: bool,
}

impl Builder {
    /// Creates a builder with explicit locations. Hints default to `<out_dir>/tributary-hints`.
    #[must_use]
    pub fn new(crate_name: &str, src_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        let out_dir = out_dir.into();
        Self {
            crate_name: crate_name.replace('-', "_"),
            src_dir: src_dir.into(),
            hint_dir: out_dir.join(DEFAULT_HINT_DIR),
            out_dir,
            config: Config::default(),
            cargo_directives: false,
        }
    }

    /// Creates a builder from the environment Cargo provides to build scripts.
    ///
    /// Sources are read from `$CARGO_MANIFEST_DIR/src` and output goes to `$OUT_DIR`. The hint
    /// directory is taken from [`HINT_DIR_ENV`] when set. Cargo directives are printed.
    ///
    /// # Errors
    ///
    /// Returns an error when `CARGO_PKG_NAME`, `CARGO_MANIFEST_DIR` or `OUT_DIR` is not set.
    pub fn from_env() -> Result<Self, BuildError> {
        let crate_name = var("CARGO_PKG_NAME")?;
        let manifest_dir = PathBuf::from(var("CARGO_MANIFEST_DIR")?);
        let out_dir = PathBuf::from(var("OUT_DIR")?);

        let mut builder = Self::new(&crate_name, manifest_dir.join("src"), out_dir).with_cargo_directives(true);
        if let Some(hint_dir) = env::var_os(HINT_DIR_ENV) {
            builder = builder.with_hint_dir(hint_dir);
        }
        Ok(builder)
    }

    /// Reads sources from `src_dir` instead.
    #[must_use]
    pub fn with_src_dir(mut self, src_dir: impl Into<PathBuf>) -> Self {
        self.src_dir = src_dir.into();
        self
    }

    /// Shares hints through `hint_dir`.
    #[must_use]
    pub fn with_hint_dir(mut self, hint_dir: impl Into<PathBuf>) -> Self {
        self.hint_dir = hint_dir.into();
        self
    }

    /// Replaces the pipeline configuration.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Enables `cargo:` directives on standard output: `rerun-if-changed` for every source file
    /// and a `warning` for every contribution or scope that could not be merged.
    #[must_use]
    pub const fn with_cargo_directives(mut self, enabled: bool) -> Self {
        self.cargo_directives = enabled;
        self
    }

    /// The directory generated files are written to.
    #[must_use]
    pub fn generated_dir(&self) -> PathBuf {
        self.out_dir.join(GENERATED_DIR)
    }

    /// The directory hints are recorded in and read from.
    #[must_use]
    pub fn hint_dir(&self) -> &Path {
        &self.hint_dir
    }

    /// Loads the sources, records this crate's hints and writes every merged artifact.
    ///
    /// # Errors
    ///
    /// Returns an error when the sources cannot be loaded or parsed, or when a hint or artifact
    /// cannot be written. When only some declarations or scopes fail, every other scope is still
    /// written and [`BuildError::Unmerged`] carries the report.
    pub fn run(self) -> Result<FlushReport, BuildError> {
        let tree = SourceTree::load(&self.src_dir, &self.crate_name)?;
        if self.cargo_directives {
            println!("cargo:rerun-if-changed={}", self.src_dir.display());
            for file in tree.files() {
                println!("cargo:rerun-if-changed={}", file.display());
            }
            println!("cargo:rerun-if-env-changed={HINT_DIR_ENV}");
        }

        let units = tree.compilation_units()?;
        let mut pipeline = Pipeline::new(
            self.config,
            DirHintStore::new(&self.hint_dir),
            RustEmitter::for_crate(&self.crate_name),
        );
        let mut sink = OutputDir::new(self.out_dir.join(GENERATED_DIR));
        let report = pipeline.run(&units, &mut sink)?;

        for error in report.errors() {
            event!(Level::WARN, crate_name = %self.crate_name, %error, "contribution not merged");
            if self.cargo_directives {
                println!("cargo:warning={error}");
            }
        }
        event!(
            Level::INFO,
            crate_name = %self.crate_name,
            written = report.written().len(),
            errors = report.errors().len(),
            "build complete"
        );

        if report.is_success() {
            Ok(report)
        } else {
            Err(BuildError::Unmerged { report: Box::new(report) })
        }
    }
}

fn first_error(report: &FlushReport) -> String {
    report.errors().first().map(ToString::to_string).unwrap_or_default()
}

fn var(name: &'static str) -> Result<String, BuildError> {
    env::var(name).map_err(|source| BuildError::Env { name, source })
}
