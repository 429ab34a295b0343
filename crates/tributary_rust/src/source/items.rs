// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Conversion of `syn` items into declarations.

use std::collections::{BTreeMap, BTreeSet};

use quote::ToTokens;
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Attribute, Expr, Ident, Item, Lit, Meta, Token, Type, TypeParamBound, UnOp};
use tributary::{Annotation, ArgValue, Declaration, DeclarationKind, QualifiedName};

use super::scope::{ModuleScope, RawPath, Resolver, is_std};

const DOC: &str = "doc";

/// Registers the scopes and type items of `items` and of every inline module below them.
pub(super) fn collect_scopes(
    items: &[Item],
    module: &QualifiedName,
    modules: &mut BTreeMap<QualifiedName, ModuleScope>,
    declarations: &mut BTreeSet<QualifiedName>,
) {
    let mut scope = ModuleScope::default();

    for item in items {
        match item {
            Item::Struct(item) => declare(&mut scope, declarations, module, &item.ident),
            Item::Enum(item) => declare(&mut scope, declarations, module, &item.ident),
            Item::Trait(item) => declare(&mut scope, declarations, module, &item.ident),
            Item::Union(item) => scope.add_type(item.ident.unraw().to_string()),
            Item::Type(item) => scope.add_type(item.ident.unraw().to_string()),
            Item::Use(item) => scope.add_use(&item.tree, item.leading_colon.is_some()),
            Item::Mod(item) => {
                let child = module.join(&item.ident.unraw().to_string());
                match &item.content {
                    Some((_, content)) => collect_scopes(content, &child, modules, declarations),
                    None => {
                        modules.entry(child).or_default();
                    }
                }
            }
            _ => {}
        }
    }

    modules.entry(module.clone()).or_default().absorb(scope);
}

fn declare(scope: &mut ModuleScope, declarations: &mut BTreeSet<QualifiedName>, module: &QualifiedName, ident: &Ident) {
    let name = ident.unraw().to_string();
    declarations.insert(module.join(&name));
    scope.add_type(name);
}

/// Everything found in one file: its declarations and the trait impls it contains.
#[derive(Debug, Default)]
pub(super) struct FileDeclarations {
    pub(super) declarations: Vec<Declaration>,

    /// `(implementing type, trait)` pairs from `impl Trait for Type` blocks.
    pub(super) impls: Vec<(QualifiedName, QualifiedName)>,
}

/// Turns the items of one module, and of its inline modules, into declarations.
pub(super) fn collect_declarations(items: &[Item], module: &QualifiedName, resolver: &Resolver<'_>, found: &mut FileDeclarations) {
    let converter = Converter { resolver, module };

    for item in items {
        match item {
            Item::Struct(item) => found
                .declarations
                .push(converter.declaration(&item.ident, DeclarationKind::Struct, &item.attrs)),
            Item::Enum(item) => found
                .declarations
                .push(converter.declaration(&item.ident, DeclarationKind::Enum, &item.attrs)),
            Item::Trait(item) => {
                let mut declaration = converter.declaration(&item.ident, DeclarationKind::Trait, &item.attrs);
                for bound in &item.supertraits {
                    if let TypeParamBound::Trait(bound) = bound
                        && let Some(supertrait) = converter.trait_path(&bound.path)
                    {
                        declaration.add_supertype(supertrait);
                    }
                }
                found.declarations.push(declaration);
            }
            Item::Impl(item) => {
                if let Some((None, trait_path, _)) = &item.trait_
                    && let Type::Path(self_ty) = &*item.self_ty
                    && self_ty.qself.is_none()
                    && let Some(implementor) = converter.path(&self_ty.path)
                    && let Some(implemented) = converter.trait_path(trait_path)
                {
                    found.impls.push((implementor, implemented));
                }
            }
            Item::Mod(item) => {
                if let Some((_, content)) = &item.content {
                    let child = module.join(&item.ident.unraw().to_string());
                    collect_declarations(content, &child, resolver, found);
                }
            }
            _ => {}
        }
    }
}

/// Converts syntax found in one module.
struct Converter<'a> {
    resolver: &'a Resolver<'a>,
    module: &'a QualifiedName,
}

impl Converter<'_> {
    fn declaration(&self, ident: &Ident, kind: DeclarationKind, attrs: &[Attribute]) -> Declaration {
        let name = self.module.join(&ident.unraw().to_string());
        attrs
            .iter()
            .filter_map(|attr| self.annotation(attr))
            .fold(Declaration::new(name, kind), Declaration::with_annotation)
    }

    fn path(&self, path: &syn::Path) -> Option<QualifiedName> {
        self.resolver.resolve(self.module, &RawPath::from_path(path))
    }

    /// Resolves a trait path, dropping standard library traits.
    fn trait_path(&self, path: &syn::Path) -> Option<QualifiedName> {
        self.path(path).filter(|name| !is_std(name))
    }

    fn annotation(&self, attr: &Attribute) -> Option<Annotation> {
        let path = attr.path();
        if path.is_ident(DOC) {
            return None;
        }

        let annotation = Annotation::new(RawPath::from_path(path).text());
        let args = match &attr.meta {
            Meta::Path(_) => Vec::new(),
            Meta::List(list) => list
                .parse_args_with(Punctuated::<AttrArg, Token![,]>::parse_terminated)
                .map(|args| args.into_iter().collect())
                .unwrap_or_default(),
            Meta::NameValue(name_value) => vec![AttrArg::Positional(name_value.value.clone())],
        };

        Some(args.into_iter().fold(annotation, |annotation, arg| match arg {
            AttrArg::Named(name, value) => annotation.with_named_arg(name.unraw().to_string(), self.value(&value)),
            AttrArg::Positional(value) => annotation.with_arg(self.value(&value)),
        }))
    }

    fn value(&self, expr: &Expr) -> ArgValue {
        match expr {
            Expr::Path(expr) if expr.qself.is_none() => {
                let raw = RawPath::from_path(&expr.path);
                self.resolver
                    .resolve(self.module, &raw)
                    .map_or_else(|| ArgValue::Unresolved(raw.text()), ArgValue::Type)
            }
            Expr::Array(array) => ArgValue::Array(array.elems.iter().map(|e| self.value(e)).collect()),
            Expr::Paren(inner) => self.value(&inner.expr),
            Expr::Group(inner) => self.value(&inner.expr),
            Expr::Lit(lit) => match &lit.lit {
                Lit::Str(s) => ArgValue::Str(s.value()),
                Lit::Bool(b) => ArgValue::Bool(b.value),
                Lit::Int(i) => i
                    .base10_parse::<i64>()
                    .map_or_else(|_| ArgValue::Unresolved(i.to_string()), ArgValue::Int),
                other => ArgValue::Unresolved(other.to_token_stream().to_string()),
            },
            Expr::Unary(unary) if matches!(unary.op, UnOp::Neg(_)) => match self.value(&unary.expr) {
                ArgValue::Int(value) => value
                    .checked_neg()
                    .map_or_else(|| ArgValue::Unresolved(expr.to_token_stream().to_string()), ArgValue::Int),
                _ => ArgValue::Unresolved(expr.to_token_stream().to_string()),
            },
            other => ArgValue::Unresolved(other.to_token_stream().to_string()),
        }
    }
}

/// One attribute argument: `name = value` or a bare value.
enum AttrArg {
    Named(Ident, Expr),
    Positional(Expr),
}

impl Parse for AttrArg {
    fn parse(input: ParseStream<'_>) -> syn::Result<Self> {
        if input.peek(Ident) && input.peek2(Token![=]) {
            let name: Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            return Ok(Self::Named(name, input.parse()?));
        }
        Ok(Self::Positional(input.parse()?))
    }
}
