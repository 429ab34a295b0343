// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Implementation of the marker attributes re-exported by `tributary_macros`.

use proc_macro2::TokenStream;

mod marker;

use marker::{Marker, expand};

const CONTRIBUTES_BINDING: Marker = Marker {
    name: "contributes_binding",
    scoped: true,
    extra_positional: 1,
    named: &["bound_type", "replaces", "priority"],
    traits: false,
};

const CONTRIBUTES_TO: Marker = Marker {
    name: "contributes_to",
    scoped: true,
    extra_positional: 0,
    named: &["replaces"],
    traits: true,
};

const MODULE: Marker = Marker {
    name: "module",
    scoped: false,
    extra_positional: 0,
    named: &[],
    traits: true,
};

const fn merge(name: &'static str) -> Marker {
    Marker {
        name,
        scoped: true,
        extra_positional: 0,
        named: &["exclude"],
        traits: true,
    }
}

/// Marks a concrete type as a binding contributed to a scope.
pub fn contributes_binding(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    expand(&CONTRIBUTES_BINDING, attr, item)
}

/// Marks a module or interface as contributed to a scope.
pub fn contributes_to(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    expand(&CONTRIBUTES_TO, attr, item)
}

/// Marks a type as a module, allowing `replaces` on its `contributes_to` attribute.
pub fn module(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    expand(&MODULE, attr, item)
}

/// Marks a merge point for a component.
pub fn merge_component(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    expand(&merge("merge_component"), attr, item)
}

/// Marks a merge point for a subcomponent.
pub fn merge_subcomponent(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    expand(&merge("merge_subcomponent"), attr, item)
}

/// Marks a merge point that only aggregates modules.
pub fn merge_modules(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    expand(&merge("merge_modules"), attr, item)
}
