// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared helpers for the integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset of the helpers")]

use std::io::Write;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;
use tributary::emit::{ArtifactRequest, EmitError, Emitter};
use tributary::{Annotation, ArgValue, CompilationUnit, Declaration, DeclarationKind};

/// Renders one line per class element so tests can assert on structure without a real formatter.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineEmitter;

impl Emitter for LineEmitter {
    fn emit(&self, request: &ArtifactRequest) -> Result<String, EmitError> {
        let mut lines = vec![format!("class {}", request.class_name())];
        lines.extend(request.includes().iter().map(|include| format!("include {include}")));
        for method in request.methods() {
            let params: Vec<_> = method.params().iter().map(|p| format!("{}: {}", p.name(), p.ty())).collect();
            let returns = method.returns().map(ToString::to_string).unwrap_or_default();
            lines.push(format!("method {}({}) -> {returns}", method.name(), params.join(", ")));
        }
        Ok(lines.join("\n"))
    }
}

/// Rejects every request for a class with the given name.
#[derive(Debug, Clone, Copy)]
pub struct RejectClass(pub &'static str);

impl Emitter for RejectClass {
    fn emit(&self, request: &ArtifactRequest) -> Result<String, EmitError> {
        if request.class_name() == self.0 {
            return Err(EmitError::new(format!("{} is not supported", self.0)));
        }
        LineEmitter.emit(request)
    }
}

/// The method names of an artifact rendered by [`LineEmitter`].
pub fn methods(contents: &str) -> Vec<&str> {
    contents
        .lines()
        .filter_map(|line| line.strip_prefix("method "))
        .map(|line| line.split('(').next().unwrap_or(line))
        .collect()
}

/// The includes of an artifact rendered by [`LineEmitter`].
pub fn includes(contents: &str) -> Vec<&str> {
    contents.lines().filter_map(|line| line.strip_prefix("include ")).collect()
}

/// A struct contributing itself to `scope`, bound through its single supertype `bound`.
pub fn binding(name: &str, bound: &str, scope: &str) -> Declaration {
    Declaration::new(name, DeclarationKind::Struct)
        .with_supertype(bound)
        .with_annotation(Annotation::new("contributes_binding").with_arg(ArgValue::ty(scope)))
}

/// Like [`binding`] but replacing the given contributions.
pub fn replacing(name: &str, bound: &str, scope: &str, replaces: &[&str]) -> Declaration {
    Declaration::new(name, DeclarationKind::Struct).with_supertype(bound).with_annotation(
        Annotation::new("contributes_binding")
            .with_arg(ArgValue::ty(scope))
            .with_named_arg("replaces", ArgValue::types(replaces.iter().copied())),
    )
}

/// A trait requesting the merged component of `scope`.
pub fn component(name: &str, scope: &str) -> Declaration {
    Declaration::new(name, DeclarationKind::Trait).with_annotation(Annotation::new("merge_component").with_arg(ArgValue::ty(scope)))
}

/// Like [`component`] but excluding the given types.
pub fn excluding(name: &str, scope: &str, exclude: &[&str]) -> Declaration {
    Declaration::new(name, DeclarationKind::Trait).with_annotation(
        Annotation::new("merge_component")
            .with_named_arg("scope", ArgValue::ty(scope))
            .with_named_arg("exclude", ArgValue::types(exclude.iter().copied())),
    )
}

/// A unit holding `declarations`.
pub fn unit(file: &str, declarations: impl IntoIterator<Item = Declaration>) -> CompilationUnit {
    let mut unit = CompilationUnit::new(file);
    for declaration in declarations {
        unit.push(declaration);
    }
    unit
}

/// Captures formatted log output of the current thread.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// The captured output.
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).to_string()
    }

    pub fn assert_contains(&self, expected: &str) {
        let output = self.output();
        assert!(output.contains(expected), "log output does not contain '{expected}', got:\n{output}");
    }

    /// A subscriber writing to this capture. Install it with `tracing::subscriber::set_default`.
    pub fn subscriber(&self) -> impl tracing::Subscriber {
        use tracing_subscriber::layer::SubscriberExt;
        tracing_subscriber::registry().with(tracing_subscriber::fmt::layer().with_writer(self.clone()).with_ansi(false))
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogCaptureWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

/// Appends to the buffer of a [`LogCapture`].
#[derive(Debug)]
pub struct LogCaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for LogCaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
