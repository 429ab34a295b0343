// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for the two pipeline phases, artifact sinks and logging.

mod util;

use std::fs;

use tempfile::TempDir;
use tracing_test::traced_test;
use tributary::hints::MemoryHintStore;
use tributary::output::{MemoryOutput, OutputDir};
use tributary::scanner::MergeKind;
use tributary::{AnnotationNames, Annotation, ArgValue, Config, Declaration, DeclarationKind, Error, Pipeline, Scope};
use util::{LineEmitter, LogCapture, RejectClass, binding, component, excluding, methods, unit};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const SCOPE: &str = "app::AppScope";
const ARTIFACT: &str = "app/app_component_merged.rs";

#[test]
fn generate_reserves_every_artifact_with_a_placeholder() -> TestResult {
    let units = [unit(
        "src/app.rs",
        [
            binding("app::Impl1", "app::Api", SCOPE),
            component("app::AppComponent", SCOPE),
            component("app::di::DebugComponent", SCOPE),
        ],
    )];
    let mut pipeline = Pipeline::new(Config::default(), MemoryHintStore::new(), LineEmitter);
    let mut output = MemoryOutput::new();

    let generated = pipeline.generate(&units, &mut output)?;

    assert_eq!(output.get(ARTIFACT), Some("class AppComponentMerged"));
    assert_eq!(output.get("app/di/debug_component_merged.rs"), Some("class DebugComponentMerged"));
    assert_eq!(generated.merge_points()[&Scope::new(SCOPE)].len(), 2);
    assert_eq!(pipeline.store().len(), 1);

    let report = pipeline.flush(generated, &mut output)?;

    assert_eq!(report.written().len(), 2);
    assert_eq!(output.writes(), 4);
    assert_eq!(methods(output.get(ARTIFACT).unwrap_or_default()), ["bind_app_impl1"]);
    assert_eq!(
        methods(output.get("app/di/debug_component_merged.rs").unwrap_or_default()),
        ["bind_app_impl1"]
    );
    Ok(())
}

#[test]
fn every_merge_kind_produces_an_artifact() -> TestResult {
    let merge = |name: &str, annotation: &str| {
        Declaration::new(name, DeclarationKind::Trait).with_annotation(Annotation::new(annotation).with_arg(ArgValue::ty(SCOPE)))
    };
    let units = [unit(
        "src/app.rs",
        [
            binding("app::Impl1", "app::Api", SCOPE),
            merge("app::Component", "merge_component"),
            merge("app::Subcomponent", "merge_subcomponent"),
            merge("app::Modules", "merge_modules"),
        ],
    )];

    let mut output = MemoryOutput::new();
    let report = Pipeline::new(Config::default(), MemoryHintStore::new(), LineEmitter).run(&units, &mut output)?;

    assert!(report.is_success());
    for path in ["app/component_merged.rs", "app/subcomponent_merged.rs", "app/modules_merged.rs"] {
        assert_eq!(methods(output.get(path).unwrap_or_default()), ["bind_app_impl1"], "{path}");
    }
    Ok(())
}

#[test]
fn module_contributions_become_includes() -> TestResult {
    let contributes = |name: &str| {
        Declaration::new(name, DeclarationKind::Struct).with_annotation(Annotation::new("contributes_to").with_arg(ArgValue::ty(SCOPE)))
    };
    let units = [unit(
        "src/app.rs",
        [
            contributes("app::NetworkModule"),
            contributes("app::DatabaseModule"),
            contributes("app::OtherModule").with_annotation(Annotation::new("module")),
            component("app::AppComponent", SCOPE),
        ],
    )];

    let mut output = MemoryOutput::new();
    Pipeline::new(Config::default(), MemoryHintStore::new(), LineEmitter).run(&units, &mut output)?;

    assert_eq!(
        util::includes(output.get(ARTIFACT).unwrap_or_default()),
        ["app::DatabaseModule", "app::NetworkModule", "app::OtherModule"]
    );
    Ok(())
}

#[test]
fn artifacts_are_written_below_the_output_directory() -> TestResult {
    let out = TempDir::new()?;
    let units = [unit(
        "src/app.rs",
        [binding("app::Impl1", "app::Api", SCOPE), component("app::AppComponent", SCOPE)],
    )];

    let mut sink = OutputDir::new(out.path().join("generated"));
    Pipeline::new(Config::default(), MemoryHintStore::new(), LineEmitter).run(&units, &mut sink)?;

    let written = fs::read_to_string(out.path().join("generated").join("app").join("app_component_merged.rs"))?;
    assert_eq!(methods(&written), ["bind_app_impl1"]);

    // Only the artifact itself remains, no temporary files.
    assert_eq!(fs::read_dir(out.path().join("generated").join("app"))?.count(), 1);
    Ok(())
}

#[test]
fn unwritable_output_is_fatal() -> TestResult {
    let out = TempDir::new()?;
    let blocker = out.path().join("generated");
    fs::write(&blocker, "not a directory")?;

    let units = [unit("src/app.rs", [component("app::AppComponent", SCOPE)])];
    let error = Pipeline::new(Config::default(), MemoryHintStore::new(), LineEmitter)
        .run(&units, &mut OutputDir::new(&blocker))
        .unwrap_err();

    assert!(matches!(error, Error::Io { .. }));
    assert!(error.is_fatal());
    Ok(())
}

#[test]
fn emitter_failure_is_reported_per_artifact() -> TestResult {
    let units = [unit(
        "src/app.rs",
        [
            binding("app::Impl1", "app::Api", SCOPE),
            component("app::AppComponent", SCOPE),
            component("app::Other", SCOPE),
        ],
    )];

    let mut output = MemoryOutput::new();
    let report = Pipeline::new(Config::default(), MemoryHintStore::new(), RejectClass("OtherMerged")).run(&units, &mut output)?;

    // One failure for the placeholder and one for the final artifact.
    assert_eq!(report.errors().len(), 2);
    assert!(report.errors().iter().all(|e| matches!(e, Error::Emit { .. })));
    assert_eq!(report.written().len(), 1);
    assert_eq!(output.get("app/other_merged.rs"), None);
    Ok(())
}

#[test]
fn configuration_changes_names_and_vocabulary() -> TestResult {
    let config = Config::default()
        .with_class_suffix("Wiring")
        .with_annotations(AnnotationNames::default().with_merge(MergeKind::Component, "assemble"));
    let units = [unit(
        "src/app.rs",
        [
            binding("app::Impl1", "app::Api", SCOPE),
            Declaration::new("app::AppComponent", DeclarationKind::Trait)
                .with_annotation(Annotation::new("tributary::assemble").with_arg(ArgValue::ty(SCOPE))),
        ],
    )];

    let mut output = MemoryOutput::new();
    Pipeline::new(config, MemoryHintStore::new(), LineEmitter).run(&units, &mut output)?;

    assert_eq!(output.len(), 1);
    assert!(output.get("app/app_component_wiring.rs").is_some_and(|c| c.starts_with("class AppComponentWiring")));
    Ok(())
}

#[test]
fn scan_errors_surface_in_the_report() -> TestResult {
    let units = [unit(
        "src/app.rs",
        [
            Declaration::new("app::Lonely", DeclarationKind::Struct)
                .with_annotation(Annotation::new("contributes_binding").with_arg(ArgValue::ty(SCOPE))),
            Declaration::new("app::Broken", DeclarationKind::Trait)
                .with_annotation(Annotation::new("merge_component").with_arg(ArgValue::Unresolved("MissingScope".into()))),
            component("app::AppComponent", SCOPE),
        ],
    )];

    let mut pipeline = Pipeline::new(Config::default(), MemoryHintStore::new(), LineEmitter);
    let report = pipeline.run(&units, &mut MemoryOutput::new())?;

    let failed: Vec<_> = report
        .errors()
        .iter()
        .map(|e| match e {
            Error::Resolution { declaration, .. } => declaration.as_str(),
            _ => "",
        })
        .collect();
    assert_eq!(failed, ["app::Lonely", "app::Broken"]);
    assert!(pipeline.store().is_empty());
    Ok(())
}

#[test]
fn flush_is_logged() -> TestResult {
    let capture = LogCapture::new();
    let _guard = tracing::subscriber::set_default(capture.subscriber());

    let units = [unit(
        "src/app.rs",
        [binding("app::Impl1", "app::Api", SCOPE), component("app::AppComponent", SCOPE)],
    )];
    Pipeline::new(Config::default(), MemoryHintStore::new(), LineEmitter).run(&units, &mut MemoryOutput::new())?;

    capture.assert_contains("binding contribution found");
    capture.assert_contains("scope resolved");
    capture.assert_contains("flush complete");
    Ok(())
}

#[test]
fn unmatched_exclusions_are_logged() -> TestResult {
    let capture = LogCapture::new();
    let _guard = tracing::subscriber::set_default(capture.subscriber());

    let units = [unit(
        "src/app.rs",
        [
            binding("app::Impl1", "app::Api", SCOPE),
            excluding("app::AppComponent", SCOPE, &["app::Impl1", "app::Imp1"]),
        ],
    )];
    let mut output = MemoryOutput::new();
    Pipeline::new(Config::default(), MemoryHintStore::new(), LineEmitter).run(&units, &mut output)?;

    assert!(methods(output.get(ARTIFACT).unwrap_or_default()).is_empty());
    capture.assert_contains("excluded type matches no contribution");
    capture.assert_contains("app::Imp1");
    assert!(!capture.output().lines().any(|line| line.contains("matches no contribution") && line.contains("app::Impl1")));
    Ok(())
}

#[test]
#[traced_test]
fn skipped_declarations_are_warned_about() {
    let units = [unit(
        "src/app.rs",
        [Declaration::new("app::Lonely", DeclarationKind::Struct)
            .with_annotation(Annotation::new("contributes_binding").with_arg(ArgValue::ty(SCOPE)))],
    )];

    let report = Pipeline::new(Config::default(), MemoryHintStore::new(), LineEmitter)
        .run(&units, &mut MemoryOutput::new())
        .unwrap();

    assert_eq!(report.errors().len(), 1);
    assert!(logs_contain("declaration skipped"));
    assert!(logs_contain("app::Lonely"));
}
