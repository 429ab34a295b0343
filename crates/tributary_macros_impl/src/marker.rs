// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use proc_macro2::{Span, TokenStream};
use quote::ToTokens;
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{Expr, ExprAssign, Item, Token, parse2};

/// What a marker attribute accepts.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Marker {
    pub(crate) name: &'static str,

    /// Whether the first argument must be a scope type.
    pub(crate) scoped: bool,

    /// Positional arguments allowed after the scope.
    pub(crate) extra_positional: usize,

    pub(crate) named: &'static [&'static str],

    /// Whether the attribute may sit on a trait.
    pub(crate) traits: bool,
}

/// Checks the arguments and target of a marker attribute and returns the item unchanged.
///
/// Marker attributes only carry information for the build script, which reads them from source.
pub(crate) fn expand(marker: &Marker, attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    let item: Item = parse2(item)?;
    check_target(marker, &item)?;

    let args = Punctuated::<Expr, Token![,]>::parse_terminated.parse2(attr)?;
    check_args(marker, &args)?;

    Ok(item.into_token_stream())
}

fn check_target(marker: &Marker, item: &Item) -> syn::Result<()> {
    match item {
        Item::Struct(_) | Item::Enum(_) => Ok(()),
        Item::Trait(_) if marker.traits => Ok(()),
        _ => {
            let allowed = if marker.traits { "structs, enums and traits" } else { "structs and enums" };
            Err(syn::Error::new_spanned(
                item,
                format!("`#[{}]` can only be applied to {allowed}", marker.name),
            ))
        }
    }
}

fn check_args(marker: &Marker, args: &Punctuated<Expr, Token![,]>) -> syn::Result<()> {
    let mut positional = 0;
    let mut seen_named = false;

    for arg in args {
        if let Expr::Assign(assign) = arg {
            check_named(marker, assign)?;
            seen_named = true;
            continue;
        }

        if seen_named {
            return Err(syn::Error::new_spanned(arg, "positional arguments must come before named ones"));
        }
        let allowed = if marker.scoped { 1 + marker.extra_positional } else { 0 };
        if positional >= allowed {
            return Err(syn::Error::new_spanned(
                arg,
                format!("`#[{}]` takes at most {allowed} positional argument(s)", marker.name),
            ));
        }
        if !matches!(arg, Expr::Path(_)) {
            return Err(syn::Error::new_spanned(arg, "expected a type path"));
        }
        positional += 1;
    }

    if marker.scoped && positional == 0 {
        return Err(syn::Error::new(
            Span::call_site(),
            format!("`#[{}]` expects the scope type as its first argument", marker.name),
        ));
    }
    Ok(())
}

fn check_named(marker: &Marker, assign: &ExprAssign) -> syn::Result<()> {
    let Expr::Path(left) = &*assign.left else {
        return Err(syn::Error::new_spanned(&assign.left, "expected an argument name"));
    };
    let known = left
        .path
        .get_ident()
        .is_some_and(|ident| marker.named.iter().any(|name| ident == name));
    if known {
        return Ok(());
    }

    let expected = if marker.named.is_empty() {
        "no named arguments".to_owned()
    } else {
        marker.named.join(", ")
    };
    Err(syn::Error::new_spanned(
        &assign.left,
        format!("unknown argument for `#[{}]`, expected {expected}", marker.name),
    ))
}
