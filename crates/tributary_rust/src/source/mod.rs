// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A [`DeclarationSource`] for the Rust sources of one crate.
//!
//! Every `struct`, `enum` and `trait` becomes a [`Declaration`](tributary::Declaration) named by
//! its module path, with the crate name as first segment. Attributes become annotations. Direct
//! supertypes come from two places: the supertraits of a trait and the `impl Trait for Type`
//! blocks anywhere in the crate. Traits of `std`, `core` and `alloc` are left out, so deriving or
//! implementing `Debug` does not make the bound type of a binding ambiguous.
//!
//! Paths in attribute arguments and bounds are resolved the way the compiler would for the
//! common cases: `crate`, `self`, `super` and `::` anchors, `use` declarations (including groups,
//! renames and globs), items and child modules of the same module, and finally a fixed table of
//! standard prelude names. The prelude fallback is a best-effort heuristic, not a guarantee:
//! macros, `#[path]` attributes and re-exports through other crates are not followed.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use std::{fs, io};

use thiserror::Error;
use tracing::{Level, event};
use tributary::{CompilationUnit, DeclarationSource, QualifiedName};
use walkdir::WalkDir;

mod items;
mod scope;

use items::FileDeclarations;
use scope::{ModuleScope, Resolver};

const SOURCE_EXTENSION: &str = "rs";

/// Errors raised while loading Rust sources.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    /// A source file could not be read.
    #[error("cannot read {}", .path.display())]
    Io {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The source directory could not be walked.
    #[error("cannot walk the source directory")]
    Walk(#[from] walkdir::Error),

    /// A source file is not valid Rust.
    #[error("cannot parse {}", .path.display())]
    Parse {
        /// The file.
        path: PathBuf,
        /// The parser error.
        #[source]
        source: syn::Error,
    },
}

struct SourceFile {
    path: PathBuf,
    module: QualifiedName,
    syntax: syn::File,
}

/// The parsed sources of one crate.
pub struct SourceTree {
    crate_name: String,
    files: Vec<SourceFile>,
}

impl std::fmt::Debug for SourceTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceTree")
            .field("crate_name", &self.crate_name)
            .field("files", &self.files.iter().map(|file| &file.path).collect::<Vec<_>>())
            .finish()
    }
}

impl SourceTree {
    /// Parses every `.rs` file below `src_dir`, in path order.
    ///
    /// `crate_name` becomes the first segment of every declared name; `-` is replaced by `_` so
    /// a package name can be passed as is.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be walked or a file cannot be read or parsed.
    pub fn load(src_dir: impl AsRef<Path>, crate_name: &str) -> Result<Self, SourceError> {
        let src_dir = src_dir.as_ref();
        let mut paths = Vec::new();
        for entry in WalkDir::new(src_dir) {
            let entry = entry?;
            if entry.file_type().is_file() && entry.path().extension().is_some_and(|e| e == SOURCE_EXTENSION) {
                paths.push(entry.into_path());
            }
        }
        paths.sort();

        let mut tree = Self::empty(crate_name);
        for path in paths {
            let text = fs::read_to_string(&path).map_err(|source| SourceError::Io {
                path: path.clone(),
                source,
            })?;
            let relative = path.strip_prefix(src_dir).unwrap_or(&path).to_path_buf();
            tree.add(path, &relative, &text)?;
        }

        event!(Level::DEBUG, crate_name = %tree.crate_name, files = tree.files.len(), "source tree loaded");
        Ok(tree)
    }

    /// Builds a tree from in-memory sources. Paths are relative to the crate's `src` directory.
    ///
    /// # Errors
    ///
    /// Returns an error when a source cannot be parsed.
    pub fn from_sources<I, P, T>(crate_name: &str, sources: I) -> Result<Self, SourceError>
    where
        I: IntoIterator<Item = (P, T)>,
        P: Into<PathBuf>,
        T: AsRef<str>,
    {
        let mut sources: Vec<(PathBuf, T)> = sources.into_iter().map(|(path, text)| (path.into(), text)).collect();
        sources.sort_by(|a, b| a.0.cmp(&b.0));

        let mut tree = Self::empty(crate_name);
        for (path, text) in sources {
            tree.add(path.clone(), &path, text.as_ref())?;
        }
        Ok(tree)
    }

    /// The normalized crate name.
    #[must_use]
    pub fn crate_name(&self) -> &str {
        &self.crate_name
    }

    /// Paths of the parsed files, in path order.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|file| file.path.as_path())
    }

    fn empty(crate_name: &str) -> Self {
        Self {
            crate_name: crate_name.replace('-', "_"),
            files: Vec::new(),
        }
    }

    fn add(&mut self, path: PathBuf, relative: &Path, text: &str) -> Result<(), SourceError> {
        let syntax = syn::parse_file(text).map_err(|source| SourceError::Parse {
            path: path.clone(),
            source,
        })?;
        let module = module_path(&self.crate_name, relative);
        event!(Level::TRACE, path = %path.display(), %module, "source parsed");
        self.files.push(SourceFile { path, module, syntax });
        Ok(())
    }
}

impl DeclarationSource for SourceTree {
    type Error = SourceError;

    fn compilation_units(&self) -> Result<Vec<CompilationUnit>, Self::Error> {
        let mut modules: BTreeMap<QualifiedName, ModuleScope> = BTreeMap::new();
        let mut declared = BTreeSet::new();
        for file in &self.files {
            items::collect_scopes(&file.syntax.items, &file.module, &mut modules, &mut declared);
        }

        let resolver = Resolver::new(&self.crate_name, &modules, &declared);
        let mut files = Vec::with_capacity(self.files.len());
        let mut impls: BTreeMap<QualifiedName, Vec<QualifiedName>> = BTreeMap::new();
        for file in &self.files {
            let mut found = FileDeclarations::default();
            items::collect_declarations(&file.syntax.items, &file.module, &resolver, &mut found);
            for (implementor, implemented) in found.impls {
                impls.entry(implementor).or_default().push(implemented);
            }
            files.push((file.path.clone(), found.declarations));
        }

        Ok(files
            .into_iter()
            .map(|(path, declarations)| {
                let mut unit = CompilationUnit::new(path);
                for mut declaration in declarations {
                    for implemented in impls.get(declaration.name()).into_iter().flatten() {
                        declaration.add_supertype(implemented.clone());
                    }
                    unit.push(declaration);
                }
                unit
            })
            .collect())
    }
}

/// The module a file defines, from its path relative to the crate's `src` directory.
///
/// `lib.rs` and `main.rs` at the top define the crate root and `mod.rs` defines its directory.
fn module_path(crate_name: &str, relative: &Path) -> QualifiedName {
    let components: Vec<&str> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();

    let mut module = QualifiedName::new(crate_name);
    let Some((file, dirs)) = components.split_last() else {
        return module;
    };
    for dir in dirs {
        module = module.join(dir);
    }

    let stem = Path::new(file).file_stem().and_then(|s| s.to_str()).unwrap_or(file);
    match stem {
        "mod" => module,
        "lib" | "main" if dirs.is_empty() => module,
        other => module.join(other),
    }
}
