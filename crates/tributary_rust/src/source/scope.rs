// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Module scopes and path resolution.

use std::collections::{BTreeMap, BTreeSet};

use syn::ext::IdentExt;
use syn::{Path, UseTree};
use tributary::QualifiedName;

const CRATE: &str = "crate";
const SELF: &str = "self";
const SUPER: &str = "super";

/// Crates whose traits are never recorded as supertypes.
const STD_CRATES: [&str; 3] = ["std", "core", "alloc"];

/// Names in the standard prelude, consulted after imports and local items have failed.
///
/// Only the names that can reasonably appear as a type or trait in an attribute or a bound are
/// listed. Anything not listed stays unresolved.
const PRELUDE: &[(&str, &str)] = &[
    ("AsMut", "std::convert::AsMut"),
    ("AsRef", "std::convert::AsRef"),
    ("Box", "std::boxed::Box"),
    ("Clone", "std::clone::Clone"),
    ("Copy", "std::marker::Copy"),
    ("Default", "std::default::Default"),
    ("DoubleEndedIterator", "std::iter::DoubleEndedIterator"),
    ("Drop", "std::ops::Drop"),
    ("Eq", "std::cmp::Eq"),
    ("ExactSizeIterator", "std::iter::ExactSizeIterator"),
    ("Extend", "std::iter::Extend"),
    ("Fn", "std::ops::Fn"),
    ("FnMut", "std::ops::FnMut"),
    ("FnOnce", "std::ops::FnOnce"),
    ("From", "std::convert::From"),
    ("FromIterator", "std::iter::FromIterator"),
    ("Into", "std::convert::Into"),
    ("IntoIterator", "std::iter::IntoIterator"),
    ("Iterator", "std::iter::Iterator"),
    ("Option", "std::option::Option"),
    ("Ord", "std::cmp::Ord"),
    ("PartialEq", "std::cmp::PartialEq"),
    ("PartialOrd", "std::cmp::PartialOrd"),
    ("Result", "std::result::Result"),
    ("Send", "std::marker::Send"),
    ("Sized", "std::marker::Sized"),
    ("String", "std::string::String"),
    ("Sync", "std::marker::Sync"),
    ("ToOwned", "std::borrow::ToOwned"),
    ("ToString", "std::string::ToString"),
    ("TryFrom", "std::convert::TryFrom"),
    ("TryInto", "std::convert::TryInto"),
    ("Unpin", "std::marker::Unpin"),
    ("Vec", "std::vec::Vec"),
];

/// A path as written in source, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct RawPath {
    absolute: bool,
    segments: Vec<String>,
}

impl RawPath {
    pub(super) fn from_path(path: &Path) -> Self {
        Self {
            absolute: path.leading_colon.is_some(),
            segments: path.segments.iter().map(|s| s.ident.unraw().to_string()).collect(),
        }
    }

    /// The path as source text, used when it cannot be resolved.
    pub(super) fn text(&self) -> String {
        let joined = self.segments.join("::");
        if self.absolute { format!("::{joined}") } else { joined }
    }
}

/// Everything a module makes nameable: imports, glob imports and its own type items.
#[derive(Debug, Clone, Default)]
pub(super) struct ModuleScope {
    imports: BTreeMap<String, RawPath>,
    globs: Vec<RawPath>,
    types: BTreeSet<String>,
}

impl ModuleScope {
    pub(super) fn add_type(&mut self, name: String) {
        self.types.insert(name);
    }

    /// Records every name a `use` tree brings into scope.
    pub(super) fn add_use(&mut self, tree: &UseTree, absolute: bool) {
        self.add_use_tree(tree, &mut Vec::new(), absolute);
    }

    pub(super) fn absorb(&mut self, other: Self) {
        self.imports.extend(other.imports);
        self.globs.extend(other.globs);
        self.types.extend(other.types);
    }

    fn add_use_tree(&mut self, tree: &UseTree, prefix: &mut Vec<String>, absolute: bool) {
        match tree {
            UseTree::Path(path) => {
                prefix.push(path.ident.unraw().to_string());
                self.add_use_tree(&path.tree, prefix, absolute);
                prefix.pop();
            }
            UseTree::Name(name) => self.import(name.ident.unraw().to_string(), None, prefix, absolute),
            UseTree::Rename(rename) => self.import(
                rename.ident.unraw().to_string(),
                Some(rename.rename.unraw().to_string()),
                prefix,
                absolute,
            ),
            UseTree::Glob(_) => self.globs.push(RawPath {
                absolute,
                segments: prefix.clone(),
            }),
            UseTree::Group(group) => {
                for item in &group.items {
                    self.add_use_tree(item, prefix, absolute);
                }
            }
        }
    }

    fn import(&mut self, name: String, alias: Option<String>, prefix: &[String], absolute: bool) {
        let mut segments = prefix.to_vec();
        let local = if name == SELF {
            match prefix.last() {
                Some(last) => last.clone(),
                None => return,
            }
        } else {
            segments.push(name.clone());
            name
        };

        // `use x as _` only brings trait methods into scope.
        let local = alias.unwrap_or(local);
        if local != "_" {
            self.imports.insert(local, RawPath { absolute, segments });
        }
    }
}

/// How a path starts.
enum Anchor {
    /// Relative to the current module's scope.
    Relative,
    /// Absolute or anchored at `crate`, `self` or `super`.
    Resolved(QualifiedName),
    /// Too many `super` segments.
    AboveRoot,
}

/// Resolves paths against the module scopes of one crate.
#[derive(Debug)]
pub(super) struct Resolver<'a> {
    crate_name: &'a str,
    modules: &'a BTreeMap<QualifiedName, ModuleScope>,
    declarations: &'a BTreeSet<QualifiedName>,
}

impl<'a> Resolver<'a> {
    pub(super) const fn new(
        crate_name: &'a str,
        modules: &'a BTreeMap<QualifiedName, ModuleScope>,
        declarations: &'a BTreeSet<QualifiedName>,
    ) -> Self {
        Self {
            crate_name,
            modules,
            declarations,
        }
    }

    /// Resolves a type path written in `module`.
    ///
    /// Tried in order: `::`, `crate`, `self` and `super` anchors; the module's imports; the
    /// module's own items and child modules; glob imports; the standard prelude. A single-segment
    /// path that matches none of these is unresolved. A longer path that matches none of them is
    /// taken as an absolute path into another crate.
    pub(super) fn resolve(&self, module: &QualifiedName, path: &RawPath) -> Option<QualifiedName> {
        match self.anchored(module, path) {
            Anchor::Resolved(name) => return Some(name),
            Anchor::AboveRoot => return None,
            Anchor::Relative => {}
        }

        let (first, rest) = path.segments.split_first()?;
        let scope = self.modules.get(module);

        if let Some(target) = scope.and_then(|s| s.imports.get(first)) {
            return self.resolve_use(module, target).map(|base| extend(base, rest));
        }

        if self.is_local(module, first) {
            return Some(extend(module.join(first), rest));
        }

        if !rest.is_empty() {
            return Some(QualifiedName::from_segments(&path.segments));
        }

        let from_glob = scope
            .into_iter()
            .flat_map(|s| &s.globs)
            .filter_map(|glob| self.resolve_use(module, glob))
            .map(|prefix| prefix.join(first))
            .find(|candidate| self.declarations.contains(candidate));

        from_glob.or_else(|| prelude(first))
    }

    /// Resolves the target of a `use` declaration in `module`.
    fn resolve_use(&self, module: &QualifiedName, path: &RawPath) -> Option<QualifiedName> {
        match self.anchored(module, path) {
            Anchor::Resolved(name) => return Some(name),
            Anchor::AboveRoot => return None,
            Anchor::Relative => {}
        }

        let first = path.segments.first()?;
        if self.is_local(module, first) {
            return Some(extend(module.clone(), &path.segments));
        }
        Some(QualifiedName::from_segments(&path.segments))
    }

    /// Handles absolute and `crate`/`self`/`super` anchored paths.
    fn anchored(&self, module: &QualifiedName, path: &RawPath) -> Anchor {
        if path.absolute {
            return Anchor::Resolved(QualifiedName::from_segments(&path.segments));
        }

        let Some(first) = path.segments.first() else {
            return Anchor::Relative;
        };
        match first.as_str() {
            CRATE => Anchor::Resolved(extend(QualifiedName::new(self.crate_name), &path.segments[1..])),
            SELF => Anchor::Resolved(extend(module.clone(), &path.segments[1..])),
            SUPER => {
                let mut base = Some(module.clone());
                let supers = path.segments.iter().take_while(|s| *s == SUPER).count();
                for _ in 0..supers {
                    base = base.and_then(|b| b.package());
                }
                base.map_or(Anchor::AboveRoot, |b| Anchor::Resolved(extend(b, &path.segments[supers..])))
            }
            _ => Anchor::Relative,
        }
    }

    /// Whether `name` is a type item or child module of `module`.
    fn is_local(&self, module: &QualifiedName, name: &str) -> bool {
        self.modules.get(module).is_some_and(|s| s.types.contains(name)) || self.modules.contains_key(&module.join(name))
    }
}

/// Whether `name` lives in the standard library.
pub(super) fn is_std(name: &QualifiedName) -> bool {
    name.segments().next().is_some_and(|first| STD_CRATES.contains(&first))
}

fn prelude(name: &str) -> Option<QualifiedName> {
    PRELUDE
        .binary_search_by(|(simple, _)| simple.cmp(&name))
        .ok()
        .map(|index| QualifiedName::new(PRELUDE[index].1))
}

fn extend(base: QualifiedName, rest: &[String]) -> QualifiedName {
    rest.iter().fold(base, |name, segment| name.join(segment))
}
