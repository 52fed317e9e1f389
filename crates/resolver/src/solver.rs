//! Solve one request: feasibility, preference objectives, answer extraction

use crate::analysis::{analyze, Analysis};
use crate::diagnostics::diagnose;
use crate::hooks::{timed, Nudge, Profile};
use crate::input::{Input, InputOptions};
use crate::problem::Problem;
use crate::sat::{Assignment, Constraint, Literal, PackageVariables, SatSolver, Variable};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use versolve_catalog::DependencyCache;
use versolve_config::ResolverConfig;
use versolve_errors::Error;
use versolve_types::Version;

/// Package name to selected version
pub type SolverAnswer = BTreeMap<String, String>;

/// What a successful resolve produces
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOutput {
    pub answer: SolverAnswer,
    /// Every distinct valid answer, when enumeration was requested
    pub all_answers: Option<Vec<SolverAnswer>>,
}

/// Tuning and hooks for one solve
#[derive(Clone)]
pub struct SolverOptions {
    pub nudge: Option<Nudge>,
    pub nudge_interval: u64,
    pub all_answers_limit: usize,
    pub max_constraints_per_package: usize,
    pub profile: Option<Arc<dyn Profile>>,
}

impl SolverOptions {
    #[must_use]
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            nudge: None,
            nudge_interval: config.solver.nudge_interval,
            all_answers_limit: config.solver.all_answers_limit,
            max_constraints_per_package: config.diagnostics.max_constraints_per_package,
            profile: None,
        }
    }

    pub(crate) fn sat_solver(&self) -> SatSolver {
        SatSolver::new().with_nudge(self.nudge.clone(), self.nudge_interval)
    }
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default())
    }
}

impl fmt::Debug for SolverOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolverOptions")
            .field("nudge", &self.nudge.is_some())
            .field("nudge_interval", &self.nudge_interval)
            .field("all_answers_limit", &self.all_answers_limit)
            .field("max_constraints_per_package", &self.max_constraints_per_package)
            .field("profile", &self.profile.is_some())
            .finish()
    }
}

/// Solver for a single request.
///
/// Construction analyzes the request and encodes it; [`Solver::get_answer`]
/// searches. Among all valid answers the chosen one, in priority order:
/// 1. uses the fewest prerelease versions nobody asked for
/// 2. keeps top-level packages compatible with the previous answer, then
///    changes as few previous versions as possible
/// 3. gives each package being upgraded its newest feasible version
/// 4. picks the remaining versions top-down by per-package preference
pub struct Solver<'a, C = DependencyCache> {
    input: &'a Input<C>,
    options: SolverOptions,
    analysis: Analysis,
    problem: Problem,
}

impl<'a, C: Borrow<DependencyCache>> Solver<'a, C> {
    /// # Errors
    ///
    /// Returns an error if a top-level package is unknown, the top-level
    /// constraints admit no version of some package, or the cache is
    /// inconsistent.
    pub fn new(input: &'a Input<C>, options: SolverOptions) -> Result<Self, Error> {
        let profile = options.profile.clone();
        timed(profile.as_deref(), "new ConstraintSolver.Solver", move || {
            let analysis = analyze(input)?;
            let problem = Problem::build(input, &analysis, false, options.sat_solver())?;
            Ok(Self {
                input,
                options,
                analysis,
                problem,
            })
        })
    }

    /// Find the preferred answer, and every answer if `all_answers` is set
    ///
    /// # Errors
    ///
    /// Returns a solver error describing the conflict when no answer exists.
    pub fn get_answer(mut self, all_answers: bool) -> Result<ResolveOutput, Error> {
        let profile = self.options.profile.clone();
        timed(profile.as_deref(), "Solver#getAnswer", || self.answer(all_answers))
    }

    fn answer(&mut self, all_answers: bool) -> Result<ResolveOutput, Error> {
        let enumeration = all_answers.then(|| self.problem.sat.clone());
        let Some(model) = self.problem.sat.solve() else {
            debug!("no answer, diagnosing");
            return Err(diagnose(self.input, &self.analysis, &self.options));
        };

        let literals = self.unanticipated_prereleases();
        let model = self.minimize("unanticipated prereleases", &literals, model)?;
        let literals = self.incompatible_with_previous();
        let model = self.minimize("incompatible root updates", &literals, model)?;
        let literals = self.changed_from_previous();
        let model = self.minimize("changed versions", &literals, model)?;
        let model = self.pin_upgrades(model)?;

        let input = self.input;
        let preferences = Preferences::new(input);
        let settled = self.problem.settle(input.catalog_cache(), model, |package, vars| {
            preferences.order(package, vars)
        })?;

        let mut answer = SolverAnswer::new();
        for package in &settled.order {
            if let Some(version) = self.problem.selected(&settled.model, package) {
                answer.insert(package.clone(), version.raw().to_string());
            }
        }
        info!(
            packages = answer.len(),
            decisions = self.problem.sat.stats().decisions,
            "solved"
        );

        let all_answers = match enumeration {
            Some(sat) => Some(self.enumerate(sat)?),
            None => None,
        };
        Ok(ResolveOutput {
            answer,
            all_answers,
        })
    }

    fn minimize(
        &mut self,
        step: &str,
        literals: &[Literal],
        model: Assignment,
    ) -> Result<Assignment, Error> {
        if literals.is_empty() {
            return Ok(model);
        }
        let (cost, model) = self
            .problem
            .sat
            .minimize(literals)
            .ok_or_else(|| Error::internal(format!("lost feasibility minimizing {step}")))?;
        debug!(step, cost, "minimized");
        Ok(model)
    }

    fn unanticipated_prereleases(&self) -> Vec<Literal> {
        self.problem
            .vars
            .packages()
            .flat_map(|(package, vars)| {
                vars.versions
                    .iter()
                    .filter(move |(version, _)| !self.analysis.is_anticipated(package, version))
                    .map(|&(_, var)| Literal::positive(var))
            })
            .collect()
    }

    fn incompatible_with_previous(&self) -> Vec<Literal> {
        let options = self.input.options();
        if options.allow_incompatible_update {
            return Vec::new();
        }
        let mut literals = Vec::new();
        for root in &self.problem.roots {
            if options.is_upgrading(root) {
                continue;
            }
            let (Some(previous), Some(vars)) = (previous(options, root), self.problem.vars.package(root))
            else {
                continue;
            };
            literals.extend(
                vars.versions
                    .iter()
                    .filter(|(version, _)| !version.is_compatible_with(&previous))
                    .map(|&(_, var)| Literal::positive(var)),
            );
        }
        literals
    }

    fn changed_from_previous(&self) -> Vec<Literal> {
        let options = self.input.options();
        let Some(solution) = &options.previous_solution else {
            return Vec::new();
        };
        let mut literals = Vec::new();
        for (package, previous) in solution {
            if options.is_upgrading(package)
                || (options.upgrade_indirect_dep_patch_versions && !self.input.is_root(package))
            {
                continue;
            }
            let Some(vars) = self.problem.vars.package(package) else {
                continue;
            };
            literals.extend(
                vars.versions
                    .iter()
                    .filter(|(version, _)| version.raw() != previous)
                    .map(|&(_, var)| Literal::positive(var)),
            );
        }
        literals
    }

    /// Fix each upgraded package that is part of the answer at its newest
    /// feasible version
    fn pin_upgrades(&mut self, mut model: Assignment) -> Result<Assignment, Error> {
        let mut upgrade: Vec<String> = self.input.options().upgrade.clone();
        upgrade.sort();
        upgrade.dedup();

        for package in &upgrade {
            let Some(vars) = self.problem.vars.package(package) else {
                continue;
            };
            if !model.is_true(vars.included) {
                continue;
            }
            let included = vars.included;
            let candidates = newest_first(vars);

            let mut pinned = None;
            for var in candidates {
                if model.is_true(var) {
                    pinned = Some(var);
                    break;
                }
                if let Some(found) = self
                    .problem
                    .sat
                    .solve_assuming(vec![Constraint::unit(Literal::positive(var))])
                {
                    model = found;
                    pinned = Some(var);
                    break;
                }
            }
            let var = pinned.ok_or_else(|| {
                Error::internal(format!("no feasible version of upgraded package {package}"))
            })?;
            self.problem
                .sat
                .add_clause(vec![Literal::negative(included), Literal::positive(var)]);
            debug!(package, "pinned upgrade");
        }
        Ok(model)
    }

    /// Enumerate distinct answers of the unoptimized problem
    fn enumerate(&self, mut sat: SatSolver) -> Result<Vec<SolverAnswer>, Error> {
        let cache = self.input.catalog_cache();
        let mut answers: Vec<SolverAnswer> = Vec::new();
        while answers.len() < self.options.all_answers_limit {
            let Some(model) = sat.solve() else {
                break;
            };
            let closure = self.problem.closure(cache, &model)?;
            answers.push(
                closure
                    .iter()
                    .map(|(package, (version, _))| (package.clone(), version.raw().to_string()))
                    .collect(),
            );
            if closure.is_empty() {
                break;
            }
            sat.add_clause(
                closure
                    .values()
                    .map(|&(_, var)| Literal::negative(var))
                    .collect(),
            );
        }
        debug!(answers = answers.len(), "enumerated answers");
        Ok(answers)
    }
}

impl<C> fmt::Debug for Solver<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solver")
            .field("options", &self.options)
            .field("reachable", &self.analysis.reachable.len())
            .field("sat", &self.problem.sat)
            .finish_non_exhaustive()
    }
}

fn previous(options: &InputOptions, package: &str) -> Option<Version> {
    options
        .previous_version(package)
        .and_then(|raw| Version::parse(raw).ok())
}

fn newest_first(vars: &PackageVariables) -> Vec<Variable> {
    vars.versions.iter().rev().map(|&(_, var)| var).collect()
}

/// Oldest `major.minor` line first, newest patch first within each line
fn oldest_line_first(vars: &PackageVariables) -> Vec<Variable> {
    let mut order = Vec::with_capacity(vars.versions.len());
    let mut line: Vec<Variable> = Vec::new();
    let mut current: Option<(u64, u64)> = None;
    for (version, var) in &vars.versions {
        let key = (version.major(), version.minor());
        if current != Some(key) {
            order.extend(line.drain(..).rev());
            current = Some(key);
        }
        line.push(*var);
    }
    order.extend(line.into_iter().rev());
    order
}

/// Per-package candidate order used when settling the answer
pub(crate) struct Preferences<'a> {
    options: &'a InputOptions,
    roots: &'a [String],
}

impl<'a> Preferences<'a> {
    pub fn new<C: Borrow<DependencyCache>>(input: &'a Input<C>) -> Self {
        Self {
            options: input.options(),
            roots: input.dependencies(),
        }
    }

    pub fn order(&self, package: &str, vars: &PackageVariables) -> Vec<Variable> {
        if self.options.is_upgrading(package) {
            return newest_first(vars);
        }
        let is_root = self.roots.iter().any(|root| root == package);
        let default = if is_root {
            newest_first(vars)
        } else {
            oldest_line_first(vars)
        };
        let Some(raw) = self.options.previous_version(package) else {
            return default;
        };

        let mut first: Vec<Variable> =
            if self.options.upgrade_indirect_dep_patch_versions && !is_root {
                match Version::parse(raw) {
                    Ok(prev) => vars
                        .versions
                        .iter()
                        .rev()
                        .filter(|(v, _)| v.major() == prev.major() && v.minor() == prev.minor())
                        .map(|&(_, var)| var)
                        .collect(),
                    Err(_) => Vec::new(),
                }
            } else {
                vars.version_var(raw).into_iter().collect()
            };
        let rest: Vec<Variable> = default.into_iter().filter(|var| !first.contains(var)).collect();
        first.extend(rest);
        first
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::VariableMap;
    use versolve_types::PackageConstraint;

    fn package_vars(list: &[&str]) -> PackageVariables {
        let mut sat = SatSolver::new();
        let mut map = VariableMap::new();
        let versions: Vec<Version> = list.iter().map(|v| Version::parse(v).unwrap()).collect();
        map.add_package(&mut sat, "pkg", &versions);
        map.package("pkg").unwrap().clone()
    }

    fn raw_order(vars: &PackageVariables, order: &[Variable]) -> Vec<String> {
        order
            .iter()
            .map(|var| {
                vars.versions
                    .iter()
                    .find(|(_, v)| v == var)
                    .map(|(version, _)| version.raw().to_string())
                    .unwrap()
            })
            .collect()
    }

    fn input_with(options: InputOptions) -> Input {
        Input::new(["root"], Vec::new(), DependencyCache::new(), options).unwrap()
    }

    #[test]
    fn test_indirect_prefers_oldest_line_newest_patch() {
        let vars = package_vars(&["1.0.0", "1.0.1", "1.1.0", "2.0.0"]);
        let input = input_with(InputOptions::default());
        let order = Preferences::new(&input).order("pkg", &vars);
        assert_eq!(raw_order(&vars, &order), ["1.0.1", "1.0.0", "1.1.0", "2.0.0"]);
    }

    #[test]
    fn test_previous_version_first() {
        let vars = package_vars(&["1.0.0", "1.0.1", "1.1.0"]);
        let input = input_with(InputOptions {
            previous_solution: Some(BTreeMap::from([("pkg".to_string(), "1.1.0".to_string())])),
            ..InputOptions::default()
        });
        let order = Preferences::new(&input).order("pkg", &vars);
        assert_eq!(raw_order(&vars, &order), ["1.1.0", "1.0.1", "1.0.0"]);
    }

    #[test]
    fn test_patch_upgrades_for_indirect() {
        let vars = package_vars(&["1.0.0", "1.0.1", "1.0.2", "1.1.0"]);
        let input = input_with(InputOptions {
            previous_solution: Some(BTreeMap::from([("pkg".to_string(), "1.0.0".to_string())])),
            upgrade_indirect_dep_patch_versions: true,
            ..InputOptions::default()
        });
        let order = Preferences::new(&input).order("pkg", &vars);
        assert_eq!(raw_order(&vars, &order), ["1.0.2", "1.0.1", "1.0.0", "1.1.0"]);
    }

    #[test]
    fn test_upgrade_prefers_newest() {
        let vars = package_vars(&["1.0.0", "2.0.0"]);
        let input = input_with(InputOptions {
            upgrade: vec!["pkg".to_string()],
            previous_solution: Some(BTreeMap::from([("pkg".to_string(), "1.0.0".to_string())])),
            ..InputOptions::default()
        });
        let order = Preferences::new(&input).order("pkg", &vars);
        assert_eq!(raw_order(&vars, &order), ["2.0.0", "1.0.0"]);
    }

    #[test]
    fn test_solver_picks_newest_root() {
        let mut cache = DependencyCache::new();
        for v in ["1.0.0", "1.1.0"] {
            cache.add_package_version("root", v, Vec::new()).unwrap();
        }
        let input = Input::new(
            ["root"],
            vec![PackageConstraint::parse("root@1.0.0").unwrap()],
            cache,
            InputOptions::default(),
        )
        .unwrap();
        let output = Solver::new(&input, SolverOptions::default())
            .unwrap()
            .get_answer(true)
            .unwrap();
        assert_eq!(output.answer["root"], "1.1.0");
        assert_eq!(output.all_answers.unwrap().len(), 2);
    }

    #[test]
    fn test_prerelease_avoided_unless_anticipated() {
        let mut cache = DependencyCache::new();
        for v in ["1.0.0", "1.1.0-rc.1"] {
            cache.add_package_version("root", v, Vec::new()).unwrap();
        }
        let plain = Input::new(["root"], Vec::new(), cache.clone(), InputOptions::default()).unwrap();
        let output = Solver::new(&plain, SolverOptions::default())
            .unwrap()
            .get_answer(false)
            .unwrap();
        assert_eq!(output.answer["root"], "1.0.0");
        assert!(output.all_answers.is_none());

        let anticipating = Input::new(
            ["root"],
            Vec::new(),
            cache,
            InputOptions {
                anticipated_prereleases: BTreeMap::from([(
                    "root".to_string(),
                    ["1.1.0-rc.1".to_string()].into(),
                )]),
                ..InputOptions::default()
            },
        )
        .unwrap();
        let output = Solver::new(&anticipating, SolverOptions::default())
            .unwrap()
            .get_answer(false)
            .unwrap();
        assert_eq!(output.answer["root"], "1.1.0-rc.1");
    }
}
