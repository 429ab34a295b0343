// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Marker attributes for [`tributary`](https://docs.rs/tributary) contribution merging.
//!
//! The attributes do not generate code. They check their arguments, leave the item untouched and
//! are read back from source by the `tributary_rust` build script integration, which writes the
//! merged wiring into `OUT_DIR`.
//!
//! ```rust
//! use tributary_macros::{contributes_binding, contributes_to, merge_component, module};
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
//! #[module]
//! #[contributes_to(AppScope)]
//! pub struct NetworkModule;
//!
//! #[merge_component(AppScope)]
//! pub trait AppComponent {}
//! ```
//!
//! Type arguments are resolved the way the compiler would resolve them at the attribute's
//! location, through `use` declarations, local items and absolute paths.

use proc_macro::TokenStream;

/// Contributes a concrete type as a binding to a scope.
///
/// The first argument is the scope. The bound type is the type's single direct supertrait
/// unless given as a second argument or as `bound_type = Type`. Only traits implemented with an
/// `impl Trait for Type` block in the same crate and not from the standard library count as
/// supertraits.
///
/// # Arguments
///
/// - `bound_type = Type` binds the contribution as `Type`.
/// - `replaces = [A, B]` removes the listed contributions from every scope this one is merged into.
/// - `priority = n` keeps only the highest-priority bindings of one bound type. Defaults to 0.
///
/// ```rust
/// # use tributary_macros::contributes_binding;
/// # pub struct AppScope;
/// # pub trait Api {}
/// # pub struct LegacyApi;
/// #[contributes_binding(AppScope, bound_type = Api, replaces = [LegacyApi], priority = 10)]
/// pub struct ModernApi;
/// # impl Api for ModernApi {}
/// ```
#[proc_macro_attribute]
pub fn contributes_binding(attr: TokenStream, item: TokenStream) -> TokenStream {
    tributary_macros_impl::contributes_binding(attr.into(), item.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Contributes a module or interface to a scope.
///
/// Merge points list every contributed module or interface. `replaces = [A, B]` is only allowed
/// on types that are also marked with [`macro@module`].
#[proc_macro_attribute]
pub fn contributes_to(attr: TokenStream, item: TokenStream) -> TokenStream {
    tributary_macros_impl::contributes_to(attr.into(), item.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Marks a type as a module.
#[proc_macro_attribute]
pub fn module(attr: TokenStream, item: TokenStream) -> TokenStream {
    tributary_macros_impl::module(attr.into(), item.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Requests a merged component for a scope.
///
/// The build script generates `<Name>Merged` with one function per binding contributed to the
/// scope. `exclude = [A, B]` drops the listed contributions from this merge point only.
///
/// ```rust
/// # use tributary_macros::merge_component;
/// # pub struct AppScope;
/// # pub struct DebugImpl;
/// #[merge_component(AppScope, exclude = [DebugImpl])]
/// pub trait ReleaseComponent {}
/// ```
#[proc_macro_attribute]
pub fn merge_component(attr: TokenStream, item: TokenStream) -> TokenStream {
    tributary_macros_impl::merge_component(attr.into(), item.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Requests a merged subcomponent for a scope. Accepts the same arguments as
/// [`macro@merge_component`].
#[proc_macro_attribute]
pub fn merge_subcomponent(attr: TokenStream, item: TokenStream) -> TokenStream {
    tributary_macros_impl::merge_subcomponent(attr.into(), item.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Requests a merged module for a scope. Accepts the same arguments as
/// [`macro@merge_component`].
#[proc_macro_attribute]
pub fn merge_modules(attr: TokenStream, item: TokenStream) -> TokenStream {
    tributary_macros_impl::merge_modules(attr.into(), item.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
