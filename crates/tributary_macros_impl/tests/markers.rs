// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for marker attribute validation.

use proc_macro2::TokenStream;
use quote::quote;
use tributary_macros_impl::{contributes_binding, contributes_to, merge_component, merge_modules, merge_subcomponent, module};

fn error_message(result: syn::Result<TokenStream>) -> String {
    result.expect_err("expected an error").to_string()
}

#[test]
fn items_pass_through_unchanged() {
    let item = quote! {
        #[derive(Debug)]
        pub struct Impl1 {
            value: u32,
        }
    };

    let expanded = contributes_binding(quote!(AppScope, bound_type = Api, replaces = [Old], priority = -1), item.clone()).unwrap();

    assert_eq!(expanded.to_string(), item.to_string());
}

#[test]
fn every_marker_accepts_its_arguments() {
    let structure = quote!(struct Target;);
    let interface = quote!(trait Target {});

    contributes_binding(quote!(AppScope, Api), structure.clone()).unwrap();
    contributes_to(quote!(AppScope, replaces = [crate::OldModule]), interface.clone()).unwrap();
    module(TokenStream::new(), structure).unwrap();
    merge_component(quote!(crate::AppScope, exclude = [Impl1]), interface.clone()).unwrap();
    merge_subcomponent(quote!(AppScope), interface.clone()).unwrap();
    merge_modules(quote!(AppScope,), interface).unwrap();
}

#[test]
fn bindings_must_be_concrete() {
    let message = error_message(contributes_binding(quote!(AppScope), quote!(trait Api {})));
    assert_eq!(message, "`#[contributes_binding]` can only be applied to structs and enums");

    let message = error_message(contributes_to(quote!(AppScope), quote!(fn wiring() {})));
    assert_eq!(message, "`#[contributes_to]` can only be applied to structs, enums and traits");
}

#[test]
fn scope_is_required() {
    let message = error_message(merge_component(TokenStream::new(), quote!(trait AppComponent {})));
    assert_eq!(message, "`#[merge_component]` expects the scope type as its first argument");

    let message = error_message(contributes_binding(quote!(bound_type = Api), quote!(struct Impl1;)));
    assert_eq!(message, "`#[contributes_binding]` expects the scope type as its first argument");
}

#[test]
fn malformed_arguments_are_rejected() {
    let structure = quote!(struct Impl1;);

    let message = error_message(contributes_binding(quote!(AppScope, scope = Other), structure.clone()));
    assert_eq!(
        message,
        "unknown argument for `#[contributes_binding]`, expected bound_type, replaces, priority"
    );

    let message = error_message(contributes_binding(quote!(AppScope, Api, Extra), structure.clone()));
    assert_eq!(message, "`#[contributes_binding]` takes at most 2 positional argument(s)");

    let message = error_message(contributes_binding(quote!(priority = 1, AppScope), structure.clone()));
    assert_eq!(message, "positional arguments must come before named ones");

    let message = error_message(contributes_binding(quote!("AppScope"), structure.clone()));
    assert_eq!(message, "expected a type path");

    let message = error_message(module(quote!(AppScope), structure));
    assert_eq!(message, "`#[module]` takes at most 0 positional argument(s)");
}
