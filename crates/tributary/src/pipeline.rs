// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{Level, event};

use crate::config::Config;
use crate::emit::{self, Emitter};
use crate::hints::{HintKind, HintMarker, HintStore};
use crate::index::DeclarationIndex;
use crate::model::{CompilationUnit, QualifiedName, Scope};
use crate::output::ArtifactSink;
use crate::resolver::{self, ResolvedScope, ScopeContributions};
use crate::scanner::{self, MergePoint};
use crate::{Error, Result};

/// Drives one invocation through its two phases.
///
/// [`generate`](Self::generate) scans the batch, records hints and reserves every artifact path
/// with a placeholder. [`flush`](Self::flush) consumes the resulting [`Generated`] state, merges
/// in contributions recorded by other invocations and writes every final artifact exactly once.
/// Because `flush` takes `Generated` by value, a scope can neither be flushed twice nor go back
/// to scanning within one invocation.
#[derive(Debug)]
pub struct Pipeline<S, E> {
    config: Config,
    store: S,
    emitter: E,
}

/// The state between the two phases: every scope has been scanned but none resolved.
#[derive(Debug)]
pub struct Generated {
    index: DeclarationIndex,
    contributions: BTreeMap<Scope, ScopeContributions>,
    merge_points: BTreeMap<Scope, Vec<MergePoint>>,
    errors: Vec<Error>,
}

impl Generated {
    /// Merge points found in the batch, grouped by scope.
    #[must_use]
    pub const fn merge_points(&self) -> &BTreeMap<Scope, Vec<MergePoint>> {
        &self.merge_points
    }

    /// Contributions found in the batch, grouped by scope.
    #[must_use]
    pub const fn contributions(&self) -> &BTreeMap<Scope, ScopeContributions> {
        &self.contributions
    }

    /// Errors raised while generating.
    #[must_use]
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }
}

/// The outcome of a flush.
#[derive(Debug, Default)]
pub struct FlushReport {
    written: Vec<PathBuf>,
    resolved: Vec<ResolvedScope>,
    errors: Vec<Error>,
}

impl FlushReport {
    /// Relative paths of the final artifacts written, in scope order.
    #[must_use]
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Every scope resolved successfully.
    #[must_use]
    pub fn resolved(&self) -> &[ResolvedScope] {
        &self.resolved
    }

    /// Every non-fatal error of the invocation, from both phases.
    #[must_use]
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Whether the invocation finished without any error.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

impl<S, E> Pipeline<S, E>
where
    S: HintStore,
    E: Emitter,
{
    /// Creates a pipeline.
    #[must_use]
    pub const fn new(config: Config, store: S, emitter: E) -> Self {
        Self { config, store, emitter }
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The hint store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the pipeline and returns its hint store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Runs the generate phase over `units`.
    ///
    /// # Errors
    ///
    /// Returns an error only when it is fatal to the invocation: a hint or placeholder cannot be
    /// written. Declaration-level failures are collected in [`Generated::errors`].
    pub fn generate<K>(&mut self, units: &[CompilationUnit], sink: &mut K) -> Result<Generated>
    where
        K: ArtifactSink + ?Sized,
    {
        let outcome = scanner::scan(units, self.config.annotations());
        let index = DeclarationIndex::from_units(units);
        let mut contributions: BTreeMap<Scope, ScopeContributions> = BTreeMap::new();
        let mut merge_points: BTreeMap<Scope, Vec<MergePoint>> = BTreeMap::new();
        let mut errors = outcome.errors;

        for binding in outcome.bindings {
            self.record_hint(&index, HintKind::Binding, binding.scope(), binding.concrete())?;
            contributions.entry(binding.scope().clone()).or_default().add_binding(binding);
        }

        for module in outcome.modules {
            self.record_hint(&index, HintKind::Contribution, module.scope(), module.name())?;
            contributions.entry(module.scope().clone()).or_default().add_module(module);
        }

        for merge_point in outcome.merge_points {
            contributions
                .entry(merge_point.scope().clone())
                .or_default()
                .exclude(merge_point.exclude().iter().cloned());

            let request = emit::placeholder_request(&merge_point, &self.config);
            match emit::render(&self.emitter, &merge_point, &request) {
                Ok(artifact) => sink.write(&artifact)?,
                Err(error) => {
                    event!(Level::WARN, merge_point = %merge_point.declaration(), %error, "placeholder not written");
                    errors.push(error);
                }
            }

            merge_points.entry(merge_point.scope().clone()).or_default().push(merge_point);
        }

        event!(
            Level::DEBUG,
            scopes = contributions.len(),
            merge_points = merge_points.values().map(Vec::len).sum::<usize>(),
            errors = errors.len(),
            "generate complete"
        );

        Ok(Generated {
            index,
            contributions,
            merge_points,
            errors,
        })
    }

    /// Runs the flush phase: resolves every scope that has a merge point and writes its artifacts.
    ///
    /// A scope that fails to resolve or emit is skipped and its error recorded; every other scope
    /// is still flushed.
    ///
    /// # Errors
    ///
    /// Returns an error only when it is fatal to the invocation: hints cannot be read or an
    /// artifact cannot be written.
    pub fn flush<K>(&mut self, generated: Generated, sink: &mut K) -> Result<FlushReport>
    where
        K: ArtifactSink + ?Sized,
    {
        let Generated {
            mut index,
            mut contributions,
            merge_points,
            errors,
        } = generated;
        let mut report = FlushReport {
            errors,
            ..FlushReport::default()
        };

        for (scope, points) in merge_points {
            let mut scope_contributions = contributions.remove(&scope).unwrap_or_default();
            self.add_hinted(&scope, &mut scope_contributions, &mut index, &mut report.errors)?;

            let resolved = match resolver::resolve(&scope, &scope_contributions, &index) {
                Ok(resolved) => resolved,
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    event!(Level::WARN, %scope, %error, "scope not merged");
                    report.errors.push(error);
                    continue;
                }
            };

            for merge_point in &points {
                let request = emit::artifact_request(merge_point, &resolved, &self.config);
                match emit::render(&self.emitter, merge_point, &request) {
                    Ok(artifact) => {
                        sink.write(&artifact)?;
                        report.written.push(artifact.path().to_path_buf());
                    }
                    Err(error) => {
                        event!(Level::WARN, %scope, merge_point = %merge_point.declaration(), %error, "artifact not written");
                        report.errors.push(error);
                    }
                }
            }

            report.resolved.push(resolved);
        }

        event!(
            Level::INFO,
            written = report.written.len(),
            errors = report.errors.len(),
            "flush complete"
        );

        Ok(report)
    }

    /// Runs both phases back to back.
    ///
    /// # Errors
    ///
    /// Returns an error when either phase fails fatally.
    pub fn run<K>(&mut self, units: &[CompilationUnit], sink: &mut K) -> Result<FlushReport>
    where
        K: ArtifactSink + ?Sized,
    {
        let generated = self.generate(units, sink)?;
        self.flush(generated, sink)
    }

    fn record_hint(&mut self, index: &DeclarationIndex, kind: HintKind, scope: &Scope, name: &QualifiedName) -> Result<()> {
        let Some(record) = index.hint_record(name) else {
            return Ok(());
        };
        self.store
            .record(&HintMarker::new(kind, scope.clone(), name.clone()), &record)?;
        event!(Level::TRACE, %kind, %scope, contribution = %name, "hint recorded");
        Ok(())
    }

    /// Adds the contributions other invocations recorded for `scope`.
    ///
    /// Hinted declarations are scanned again and only their contributions to `scope` are kept.
    /// Records naming a declaration of the current batch are ignored.
    fn add_hinted(
        &self,
        scope: &Scope,
        contributions: &mut ScopeContributions,
        index: &mut DeclarationIndex,
        errors: &mut Vec<Error>,
    ) -> Result<()> {
        let names = self.config.annotations();

        for kind in [HintKind::Binding, HintKind::Contribution] {
            for record in self.store.lookup(scope, kind)?.into_values() {
                if !index.insert_hint(&record) {
                    event!(Level::TRACE, %scope, declaration = %record.declaration().name(), "hint superseded by current sources");
                    continue;
                }

                let found = match scanner::scan_declaration(record.declaration(), names) {
                    Ok(found) => found,
                    Err(error) => {
                        event!(Level::WARN, %scope, declaration = %record.declaration().name(), %error, "hint skipped");
                        errors.push(error);
                        continue;
                    }
                };

                match kind {
                    HintKind::Binding => found
                        .bindings
                        .into_iter()
                        .filter(|binding| binding.scope() == scope)
                        .for_each(|binding| {
                            contributions.add_binding(binding);
                        }),
                    HintKind::Contribution => found
                        .modules
                        .into_iter()
                        .filter(|module| module.scope() == scope)
                        .for_each(|module| {
                            contributions.add_module(module);
                        }),
                }
            }
        }

        Ok(())
    }
}
