// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Ident, parse2};
use tributary::emit::{ArtifactRequest, EmitError, Emitter, MethodStub, Param};
use tributary::{Annotation, ArgValue, QualifiedName};

const DOC: &str = "doc";
const HEADER: &str = "// @generated by tributary. Do not edit.\n\n";

/// Renders artifact requests as Rust source.
///
/// The generated file holds one struct named after the request's class. Without constructor
/// parameters it is a unit struct; otherwise it gets one public field per parameter and a `new`
/// function. Merged modules are listed in an `INCLUDES` constant and every binding becomes an
/// associated function that boxes the concrete type as a trait object of the bound type:
///
/// ```text
/// pub fn bind_app_impl1(impl1: crate::Impl1) -> ::std::boxed::Box<dyn crate::Api> {
///     ::std::boxed::Box::new(impl1)
/// }
/// ```
///
/// Types declared in the crate being built are written as `crate::` paths, all others as
/// absolute `::` paths. The output is meant to be pulled in with `include!` from `OUT_DIR`.
#[derive(Debug, Clone)]
pub struct RustEmitter {
    crate_name: String,
}

impl RustEmitter {
    /// Creates an emitter for code that is compiled as part of `crate_name`.
    #[must_use]
    pub fn for_crate(crate_name: &str) -> Self {
        Self {
            crate_name: crate_name.replace('-', "_"),
        }
    }

    fn path(&self, name: &QualifiedName) -> Result<TokenStream, EmitError> {
        let mut segments = name.segments().peekable();
        let root = if segments.peek() == Some(&self.crate_name.as_str()) {
            segments.next();
            quote!(crate)
        } else {
            TokenStream::new()
        };

        let idents = segments.map(ident).collect::<Result<Vec<_>, _>>()?;
        if idents.is_empty() {
            return Err(EmitError::new(format!("`{name}` does not name a type inside the crate")));
        }
        Ok(quote!(#root #(:: #idents)*))
    }

    fn method(&self, method: &MethodStub) -> Result<TokenStream, EmitError> {
        let name = ident(method.name())?;
        let docs = docs(method.annotations())?;
        let params = method
            .params()
            .iter()
            .map(|param| self.param(param))
            .collect::<Result<Vec<_>, _>>()?;

        match (method.returns(), method.params()) {
            (Some(bound), [param]) => {
                let bound = self.path(bound)?;
                let value = ident(param.name())?;
                Ok(quote! {
                    #(#docs)*
                    #[must_use]
                    pub fn #name(#(#params),*) -> ::std::boxed::Box<dyn #bound> {
                        ::std::boxed::Box::new(#value)
                    }
                })
            }
            (Some(_), _) => Err(EmitError::new(format!(
                "binding method `{}` must take exactly one parameter",
                method.name()
            ))),
            (None, _) => Ok(quote! {
                #(#docs)*
                pub fn #name(#(#params),*) {}
            }),
        }
    }

    fn param(&self, param: &Param) -> Result<TokenStream, EmitError> {
        let name = ident(param.name())?;
        let ty = self.path(param.ty())?;
        Ok(quote!(#name: #ty))
    }

    fn render(&self, request: &ArtifactRequest) -> Result<TokenStream, EmitError> {
        let class = ident(request.class_name())?;
        let docs = docs(request.annotations())?;

        let declaration = if request.constructor_params().is_empty() {
            quote! {
                #(#docs)*
                #[derive(Debug, Clone, Copy, Default)]
                pub struct #class;
            }
        } else {
            let fields = request
                .constructor_params()
                .iter()
                .map(|param| self.param(param))
                .collect::<Result<Vec<_>, _>>()?;
            let names = request
                .constructor_params()
                .iter()
                .map(|param| ident(param.name()))
                .collect::<Result<Vec<_>, _>>()?;
            quote! {
                #(#docs)*
                pub struct #class {
                    #(pub #fields,)*
                }

                impl #class {
                    /// Creates the merged struct from its dependencies.
                    #[must_use]
                    pub const fn new(#(#fields),*) -> Self {
                        Self { #(#names),* }
                    }
                }
            }
        };

        let base = match request.base_type() {
            Some(base) => {
                let base = self.path(base)?;
                quote!(impl #base for #class {})
            }
            None => TokenStream::new(),
        };

        let includes = request.includes().iter().map(QualifiedName::as_str);
        let methods = request
            .methods()
            .iter()
            .map(|method| self.method(method))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(quote! {
            #declaration

            #base

            impl #class {
                /// Modules and interfaces merged into this struct.
                pub const INCLUDES: &'static [&'static str] = &[#(#includes),*];

                #(#methods)*
            }
        })
    }
}

impl Emitter for RustEmitter {
    fn emit(&self, request: &ArtifactRequest) -> Result<String, EmitError> {
        let tokens = self.render(request)?;
        let file: syn::File = parse2(tokens).map_err(|e| EmitError::new(format!("generated code does not parse: {e}")))?;
        Ok(format!("{HEADER}{}", prettyplease::unparse(&file)))
    }
}

/// Turns a name into an identifier, escaping keywords as raw identifiers.
fn ident(name: &str) -> Result<Ident, EmitError> {
    syn::parse_str::<Ident>(name)
        .or_else(|_| syn::parse_str::<Ident>(&format!("r#{name}")))
        .map_err(|e| EmitError::new(format!("`{name}` is not a valid identifier: {e}")))
}

/// Renders `doc` annotations as doc attributes. Other annotations have no Rust equivalent.
fn docs(annotations: &[Annotation]) -> Result<Vec<TokenStream>, EmitError> {
    annotations
        .iter()
        .map(|annotation| {
            if annotation.name().as_str() != DOC {
                return Err(EmitError::new(format!("unsupported annotation `{}`", annotation.name())));
            }
            let text = annotation
                .args()
                .iter()
                .map(|arg| match arg.value() {
                    ArgValue::Str(text) => Ok(format!(" {text}")),
                    _ => Err(EmitError::new("`doc` annotations take string arguments")),
                })
                .collect::<Result<Vec<_>, _>>()?
                .concat();
            Ok(quote!(#[doc = #text]))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ArtifactRequest {
        ArtifactRequest::new(Some(QualifiedName::new("app")), "AppComponentMerged")
    }

    fn binding(name: &str, concrete: &str, bound: &str) -> MethodStub {
        MethodStub::new(name)
            .with_param(Param::new("value", concrete))
            .with_returns(QualifiedName::new(bound))
    }

    #[test]
    fn unit_struct_with_bindings() {
        let emitter = RustEmitter::for_crate("app");
        let request = request()
            .with_annotation(Annotation::new("doc").with_arg(ArgValue::Str("Merged wiring.".into())))
            .with_include(QualifiedName::new("app::NetworkModule"))
            .with_method(binding("bind_app_impl1", "app::Impl1", "app::Api"))
            .with_method(binding("bind_other_impl2", "other::Impl2", "other::Api"));

        let source = emitter.emit(&request).unwrap();

        assert!(source.starts_with(HEADER));
        assert!(source.contains("/// Merged wiring."));
        assert!(source.contains("pub struct AppComponentMerged;"));
        assert!(source.contains("\"app::NetworkModule\""));
        assert!(source.contains("pub fn bind_app_impl1(value: crate::Impl1)"));
        assert!(source.contains("::std::boxed::Box<dyn crate::Api>"));
        assert!(source.contains("pub fn bind_other_impl2(value: ::other::Impl2)"));
        assert!(source.contains("::std::boxed::Box<dyn ::other::Api>"));
        syn::parse_file(&source).unwrap();
    }

    #[test]
    fn constructor_params_become_fields() {
        let emitter = RustEmitter::for_crate("app");
        let request = request().with_constructor_param(Param::new("settings", "app::Settings"));

        let source = emitter.emit(&request).unwrap();

        assert!(source.contains("pub settings: crate::Settings"));
        assert!(source.contains("pub const fn new(settings: crate::Settings) -> Self"));
        assert!(!source.contains("derive"));
    }

    #[test]
    fn base_type_is_implemented() {
        let emitter = RustEmitter::for_crate("my-app");
        let request = request().with_base_type(Some(QualifiedName::new("my_app::di::Wiring")));

        let source = emitter.emit(&request).unwrap();

        assert!(source.contains("impl crate::di::Wiring for AppComponentMerged {}"));
    }

    #[test]
    fn keywords_become_raw_identifiers() {
        let emitter = RustEmitter::for_crate("app");
        let request = request().with_method(binding("match", "app::Impl1", "app::Api"));

        let source = emitter.emit(&request).unwrap();

        assert!(source.contains("pub fn r#match("));
    }

    #[test]
    fn invalid_requests_are_rejected() {
        let emitter = RustEmitter::for_crate("app");

        let invalid_class = ArtifactRequest::new(None, "Not Valid");
        assert!(emitter.emit(&invalid_class).is_err());

        let unsupported = request().with_annotation(Annotation::new("deprecated"));
        let error = emitter.emit(&unsupported).unwrap_err();
        assert!(error.to_string().contains("deprecated"));

        let two_params = request().with_method(
            binding("bind_app_impl1", "app::Impl1", "app::Api").with_param(Param::new("extra", "app::Extra")),
        );
        assert!(emitter.emit(&two_params).is_err());

        let crate_root = request().with_method(binding("bind_app", "app", "app::Api"));
        assert!(emitter.emit(&crate_root).is_err());
    }
}
