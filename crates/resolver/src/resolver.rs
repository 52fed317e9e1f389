//! Main dependency resolver implementation

use crate::hooks::{timed, Nudge, Profile};
use crate::input::Input;
use crate::options::ResolveOptions;
use crate::solver::{ResolveOutput, Solver, SolverOptions};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use versolve_catalog::{Catalog, CatalogLoader, DependencyCache};
use versolve_config::ResolverConfig;
use versolve_errors::{Error, SolverError};
use versolve_events::{
    CatalogEvent, EventEmitter, EventSender, FailureContext, ResolverEvent,
};
use versolve_types::PackageConstraint;

/// Result of one solve attempt
#[derive(Debug, Clone)]
pub enum SolveOutcome {
    Solved(ResolveOutput),
    /// No answer exists for this cache
    Infeasible(Error),
    /// Anything else went wrong
    Failed(Error),
}

impl SolveOutcome {
    #[must_use]
    pub fn from_result(result: Result<ResolveOutput, Error>) -> Self {
        match result {
            Ok(output) => Self::Solved(output),
            Err(err) if err.is_infeasible() => Self::Infeasible(err),
            Err(err) => Self::Failed(err),
        }
    }

    /// # Errors
    ///
    /// Returns the error of an infeasible or failed attempt.
    pub fn into_result(self) -> Result<ResolveOutput, Error> {
        match self {
            Self::Solved(output) => Ok(output),
            Self::Infeasible(err) | Self::Failed(err) => Err(err),
        }
    }
}

/// Solve a prepared request against its cache as it stands
#[must_use]
pub fn resolve_with_input<C: Borrow<DependencyCache>>(
    input: &Input<C>,
    options: SolverOptions,
    all_answers: bool,
) -> SolveOutcome {
    SolveOutcome::from_result(
        Solver::new(input, options).and_then(|solver| solver.get_answer(all_answers)),
    )
}

/// Hooks passed through to every solve. Neither changes results.
#[derive(Clone, Default)]
pub struct ResolverOptions {
    pub nudge: Option<Nudge>,
    pub profile: Option<Arc<dyn Profile>>,
    pub event_sender: Option<EventSender>,
}

impl fmt::Debug for ResolverOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverOptions")
            .field("nudge", &self.nudge.is_some())
            .field("profile", &self.profile.is_some())
            .field("event_sender", &self.event_sender.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
struct CachedResult {
    key: String,
    all_answers: bool,
    output: ResolveOutput,
}

/// Events of one resolve call, tagged with its correlation id
struct CallEvents {
    sender: Option<EventSender>,
    correlation_id: String,
}

impl EventEmitter for CallEvents {
    fn event_sender(&self) -> Option<&EventSender> {
        self.sender.as_ref()
    }

    fn correlation_id(&self) -> Option<&str> {
        Some(&self.correlation_id)
    }
}

/// Long-lived resolver over one catalog.
///
/// The dependency cache grows across calls, and the last answer is kept in a
/// single-slot cache keyed by the request. Calls take `&mut self`, so callers
/// sharing a resolver serialize them.
pub struct PackagesResolver<K> {
    loader: CatalogLoader<K>,
    cache: DependencyCache,
    config: ResolverConfig,
    options: ResolverOptions,
    result_cache: Option<CachedResult>,
    resolutions: u64,
}

impl<K: Catalog> PackagesResolver<K> {
    /// Create a resolver with default configuration and no hooks
    #[must_use]
    pub fn new(catalog: K) -> Self {
        Self::with_options(catalog, ResolverConfig::default(), ResolverOptions::default())
    }

    #[must_use]
    pub fn with_options(catalog: K, config: ResolverConfig, options: ResolverOptions) -> Self {
        Self {
            loader: CatalogLoader::new(catalog),
            cache: DependencyCache::new(),
            config,
            options,
            result_cache: None,
            resolutions: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Everything loaded from the catalog so far
    #[must_use]
    pub fn catalog_cache(&self) -> &DependencyCache {
        &self.cache
    }

    /// Forget the remembered answer
    pub fn clear_result_cache(&mut self) {
        self.result_cache = None;
    }

    /// Resolve top-level packages and constraints to one version per package
    ///
    /// # Errors
    ///
    /// Returns an error if an argument is invalid, the catalog fails, a
    /// required previous version is missing, or no answer exists.
    pub fn resolve<I, S>(
        &mut self,
        dependencies: I,
        constraints: Vec<PackageConstraint>,
        options: &ResolveOptions,
    ) -> Result<ResolveOutput, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resolutions += 1;
        let events = CallEvents {
            sender: self.options.event_sender.clone(),
            correlation_id: format!("resolve-{}", self.resolutions),
        };
        let dependencies: Vec<String> = dependencies.into_iter().map(Into::into).collect();

        events.emit_resolver(ResolverEvent::ResolutionStarted {
            dependencies: dependencies.len(),
            constraints: constraints.len(),
            has_previous_solution: options.previous_solution.is_some(),
            upgrade: options.upgrade.clone(),
        });

        let result = self.run(&events, dependencies, constraints, options);
        if let Err(err) = &result {
            match err {
                Error::Solver(SolverError::Unsatisfiable { report }) => {
                    events.emit_resolver(ResolverEvent::conflict_detected(
                        report.packages().map(str::to_string).collect(),
                        err.to_string(),
                    ));
                }
                other => events.emit_resolver(ResolverEvent::ResolutionFailed {
                    failure: FailureContext::from_error(other),
                }),
            }
        }
        result
    }

    fn run(
        &mut self,
        events: &CallEvents,
        dependencies: Vec<String>,
        constraints: Vec<PackageConstraint>,
        options: &ResolveOptions,
    ) -> Result<ResolveOutput, Error> {
        let start = Instant::now();
        let profile = self.options.profile.clone();
        let profile = profile.as_deref();

        let cache = &mut self.cache;
        let mut input = timed(profile, "new Input", move || {
            Input::new(dependencies, constraints, cache, options.input_options())
        })?;

        let key = if self.config.resolver.result_cache {
            Some(input.request_key()?)
        } else {
            None
        };
        if let (Some(key), Some(cached)) = (&key, &self.result_cache) {
            if cached.key == *key && cached.all_answers == options.all_answers {
                debug!("result cache hit");
                events.emit_resolver(ResolverEvent::ResultCacheHit {
                    total_packages: cached.output.answer.len(),
                });
                return Ok(cached.output.clone());
            }
        }

        if !options.supported_isobuild_feature_packages.is_empty() {
            let added = input.add_feature_packages(&options.supported_isobuild_feature_packages)?;
            events.emit_catalog(CatalogEvent::FeaturePackagesSeeded { added });
        }

        let added = timed(profile, "Input#loadOnlyPreviousSolution", || {
            input.load_only_previous_solution(&mut self.loader)
        })?;
        if let Some(previous) = &options.previous_solution {
            events.emit_catalog(CatalogEvent::PreviousSolutionLoaded {
                requested: previous.len(),
                added,
            });
        }

        let missing_is_error = options
            .missing_previous_version_is_error
            .unwrap_or(self.config.resolver.missing_previous_version_is_error);
        if let (true, Some(previous)) = (missing_is_error, &options.previous_solution) {
            timed(profile, "check for previous versions in catalog", || {
                for (package, version) in previous {
                    if !input.catalog_cache().has_package_version(package, version) {
                        return Err(SolverError::MissingPreviousVersion {
                            package: package.clone(),
                            version: version.clone(),
                        });
                    }
                }
                Ok(())
            })?;
        }

        let solver_options = SolverOptions {
            nudge: self.options.nudge.clone(),
            profile: self.options.profile.clone(),
            ..SolverOptions::from_config(&self.config)
        };

        let mut fast_answer = None;
        if options.wants_fast_path() {
            events.emit_resolver(ResolverEvent::FastPathAttempted {
                previous_packages: options.previous_solution.as_ref().map_or(0, BTreeMap::len),
            });
            match resolve_with_input(&input, solver_options.clone(), options.all_answers) {
                SolveOutcome::Solved(output) => fast_answer = Some(output),
                SolveOutcome::Infeasible(err) => {
                    debug!(reason = %err, "fast path inconclusive");
                    events.emit_resolver(ResolverEvent::FastPathInconclusive {
                        reason: err.to_string(),
                    });
                }
                SolveOutcome::Failed(err) => return Err(err),
            }
        }

        let used_fast_path = fast_answer.is_some();
        let output = if let Some(output) = fast_answer {
            output
        } else {
            let versions_added = timed(profile, "Input#loadFromCatalog", || {
                input.load_from_catalog(&mut self.loader)
            })?;
            events.emit_catalog(CatalogEvent::CatalogLoaded {
                versions_added,
                total_versions: input.catalog_cache().len(),
            });
            resolve_with_input(&input, solver_options, options.all_answers).into_result()?
        };

        if let Some(key) = key {
            self.result_cache = Some(CachedResult {
                key,
                all_answers: options.all_answers,
                output: output.clone(),
            });
        }

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            packages = output.answer.len(),
            duration_ms, used_fast_path, "resolution completed"
        );
        events.emit_resolver(ResolverEvent::ResolutionCompleted {
            total_packages: output.answer.len(),
            duration_ms,
            used_fast_path,
            packages_resolved: output.answer.keys().cloned().collect(),
        });
        Ok(output)
    }
}

impl<K> fmt::Debug for PackagesResolver<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackagesResolver")
            .field("cached_versions", &self.cache.len())
            .field("config", &self.config)
            .field("options", &self.options)
            .field("has_cached_result", &self.result_cache.is_some())
            .field("resolutions", &self.resolutions)
            .finish_non_exhaustive()
    }
}
