// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for running the builder against crates on disk.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing_test::traced_test;
use tributary::{Config, Error};
use tributary_rust::{BuildError, Builder};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const APP: &str = r"
    use scopes::AppScope;

    pub trait Api {}

    #[tributary_macros::contributes_binding(AppScope)]
    pub struct Impl1;

    impl Api for Impl1 {}

    #[tributary_macros::merge_component(AppScope)]
    pub trait AppComponent {}
";

/// Writes `sources` below `<root>/<name>/src` and returns a builder for that crate.
fn krate(root: &Path, name: &str, sources: &[(&str, &str)]) -> Result<Builder, std::io::Error> {
    let src = root.join(name).join("src");
    for (file, text) in sources {
        let path = src.join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, text)?;
    }
    Ok(Builder::new(name, src, root.join(name).join("out")))
}

fn artifact(builder: &Builder, relative: &str) -> Result<String, std::io::Error> {
    fs::read_to_string(builder.generated_dir().join(relative))
}

#[test]
fn merged_wiring_is_written_to_the_output_directory() -> TestResult {
    let root = TempDir::new()?;
    let builder = krate(root.path(), "app", &[("lib.rs", APP)])?;
    assert_eq!(builder.generated_dir(), root.path().join("app/out/generated"));
    assert_eq!(builder.hint_dir(), root.path().join("app/out/tributary-hints"));

    let report = builder.clone().run()?;

    assert!(report.is_success());
    assert_eq!(report.written(), [PathBuf::from("app/app_component_merged.rs")]);

    let source = artifact(&builder, "app/app_component_merged.rs")?;
    assert!(source.starts_with("// @generated by tributary"));
    assert!(source.contains("pub struct AppComponentMerged;"));
    assert!(source.contains("pub fn bind_app_impl1(impl1: crate::Impl1)"));
    assert!(source.contains("::std::boxed::Box<dyn crate::Api>"));
    syn::parse_file(&source)?;
    Ok(())
}

#[test]
fn contributions_cross_crates_through_a_shared_hint_directory() -> TestResult {
    let root = TempDir::new()?;
    let hints = root.path().join("hints");

    let library = krate(
        root.path(),
        "lib-a",
        &[(
            "lib.rs",
            r"
            use scopes::AppScope;

            pub trait Api {}

            #[contributes_binding(AppScope)]
            pub struct Impl1;

            impl Api for Impl1 {}

            #[contributes_to(AppScope)]
            pub struct NetworkModule;
            ",
        )],
    )?
    .with_hint_dir(&hints);
    let report = library.run()?;
    assert!(report.written().is_empty());

    let app = krate(
        root.path(),
        "app",
        &[("di/mod.rs", "use scopes::AppScope;\n#[merge_component(AppScope)]\npub trait AppComponent {}")],
    )?
    .with_hint_dir(&hints);
    app.clone().run()?;

    let source = artifact(&app, "app/di/app_component_merged.rs")?;
    assert!(source.contains("pub fn bind_lib_a_impl1(impl1: ::lib_a::Impl1)"));
    assert!(source.contains("dyn ::lib_a::Api"));
    assert!(source.contains("\"lib_a::NetworkModule\""));
    Ok(())
}

#[test]
fn configuration_reaches_the_pipeline() -> TestResult {
    let root = TempDir::new()?;
    let builder = krate(root.path(), "app", &[("lib.rs", APP)])?.with_config(
        Config::default()
            .with_class_suffix("Wiring")
            .with_base_type("app::Api"),
    );

    builder.clone().run()?;

    let source = artifact(&builder, "app/app_component_wiring.rs")?;
    assert!(source.contains("pub struct AppComponentWiring;"));
    assert!(source.contains("impl crate::Api for AppComponentWiring {}"));
    Ok(())
}

#[test]
#[traced_test]
fn failed_contributions_fail_the_build() {
    let root = TempDir::new().unwrap();
    let builder = krate(
        root.path(),
        "app",
        &[(
            "lib.rs",
            r"
            pub struct AppScope;
            pub struct UserScope;

            pub trait Api {}

            #[contributes_binding(AppScope)]
            pub struct Lonely;

            #[contributes_binding(UserScope, bound_type = Api)]
            pub struct Unrelated;

            #[merge_component(AppScope)]
            pub trait AppComponent {}

            #[merge_component(UserScope)]
            pub trait UserComponent {}
            ",
        )],
    )
    .unwrap();

    let error = builder.clone().run().unwrap_err();

    let BuildError::Unmerged { report } = &error else {
        panic!("unexpected error: {error}");
    };
    assert_eq!(report.errors().len(), 2);
    assert!(matches!(&report.errors()[0], Error::Resolution { declaration, .. } if declaration.as_str() == "app::Lonely"));
    assert!(matches!(&report.errors()[1], Error::BindingContract { concrete, .. } if concrete.as_str() == "app::Unrelated"));
    assert!(error.to_string().starts_with("2 contribution(s) could not be merged"));
    assert_eq!(report.written().len(), 1);
    assert!(artifact(&builder, "app/app_component_merged.rs").unwrap().contains("AppComponentMerged"));
    assert!(artifact(&builder, "app/user_component_merged.rs").unwrap().contains("UserComponentMerged"));
    assert!(logs_contain("contribution not merged"));
}

#[test]
fn invalid_sources_stop_the_build() -> TestResult {
    let root = TempDir::new()?;
    let builder = krate(root.path(), "app", &[("lib.rs", "pub struct {")])?;

    let error = builder.run().unwrap_err();

    assert!(matches!(error, BuildError::Source(_)));
    Ok(())
}
