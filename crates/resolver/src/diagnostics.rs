//! Conflict explanation for requests without an answer
//!
//! The request is re-encoded with every constraint relaxed, the number of
//! violated constraints is minimized, and the closest answer is settled the
//! same way a real answer would be. The constraints that answer breaks, and
//! the dependency chains that introduced them, make up the report.

use crate::analysis::{allows, Analysis};
use crate::input::Input;
use crate::problem::{Problem, Settled, Site};
use crate::solver::{Preferences, SolverOptions};
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};
use versolve_catalog::DependencyCache;
use versolve_errors::{
    ConflictReport, ConstraintOrigin, Error, PackageConflict, SolverError,
};
use versolve_types::Version;

/// Explain why `input` has no answer. Always returns an error.
pub(crate) fn diagnose<C: Borrow<DependencyCache>>(
    input: &Input<C>,
    analysis: &Analysis,
    options: &SolverOptions,
) -> Error {
    match explain(input, analysis, options) {
        Ok(error) | Err(error) => error,
    }
}

fn explain<C: Borrow<DependencyCache>>(
    input: &Input<C>,
    analysis: &Analysis,
    options: &SolverOptions,
) -> Result<Error, Error> {
    let cache = input.catalog_cache();
    let mut relaxed = Problem::build(input, analysis, true, options.sat_solver())?;
    let violations = relaxed.violations();
    let (cost, model) = relaxed
        .sat
        .minimize(&violations)
        .ok_or_else(|| Error::internal("relaxed problem is unsatisfiable"))?;
    debug!(cost, "minimized constraint violations");

    let preferences = Preferences::new(input);
    let settled = relaxed.settle(cache, model, |package, vars| preferences.order(package, vars))?;

    for ban in &relaxed.bans {
        if is_selected(&relaxed, &settled, &ban.package, &ban.version) {
            return Ok(SolverError::UnknownPackage {
                package: ban.missing.clone(),
                required_by: format!("{} {}", ban.package, ban.version.raw()),
            }
            .into());
        }
    }

    let report = report(&relaxed, &settled, options.max_constraints_per_package);
    if report.is_empty() {
        warn!("relaxed answer violates nothing");
        return Err(Error::internal("no answer, but no violated constraint found"));
    }
    Ok(SolverError::Unsatisfiable { report }.into())
}

/// Build metadata tells apart versions that otherwise compare equal
fn is_selected(problem: &Problem, settled: &Settled, package: &str, version: &Version) -> bool {
    problem
        .selected(&settled.model, package)
        .is_some_and(|selected| selected.raw() == version.raw())
}

fn is_active(problem: &Problem, settled: &Settled, site: &Site) -> bool {
    match &site.source {
        None => true,
        Some((package, version)) => is_selected(problem, settled, package, version),
    }
}

fn report(problem: &Problem, settled: &Settled, max_constraints: usize) -> ConflictReport {
    let mut violated: BTreeMap<&str, Vec<&Site>> = BTreeMap::new();
    for site in &problem.sites {
        if !is_active(problem, settled, site) {
            continue;
        }
        let Some(selected) = problem.selected(&settled.model, &site.package) else {
            continue;
        };
        if !allows(&site.constraint, selected) {
            violated.entry(site.package.as_str()).or_default().push(site);
        }
    }

    let rank: BTreeMap<&str, usize> = settled
        .order
        .iter()
        .enumerate()
        .map(|(i, package)| (package.as_str(), i))
        .collect();

    let mut conflicts = Vec::new();
    for (package, sites) in violated {
        let Some(selected) = problem.selected(&settled.model, package) else {
            continue;
        };

        let mut raw: Vec<String> = Vec::new();
        for site in sites {
            let constraint = site.constraint.raw().to_string();
            if !raw.contains(&constraint) {
                raw.push(constraint);
            }
        }

        let mut applied: Vec<&Site> = problem
            .sites
            .iter()
            .filter(|site| site.package == package && is_active(problem, settled, site))
            .collect();
        applied.sort_by_key(|site| match &site.source {
            None => (0, 0),
            Some((source, _)) => (1, rank.get(source.as_str()).copied().unwrap_or(usize::MAX)),
        });

        let mut seen = BTreeSet::new();
        let mut origins: Vec<ConstraintOrigin> = Vec::new();
        for site in applied {
            let origin = ConstraintOrigin {
                constraint: site.constraint.raw().to_string(),
                path: path(problem, settled, site),
            };
            if seen.insert((origin.constraint.clone(), origin.path.clone())) {
                origins.push(origin);
            }
        }
        let omitted = origins.len().saturating_sub(max_constraints);
        origins.truncate(max_constraints);

        conflicts.push(PackageConflict {
            package: package.to_string(),
            selected: Some(selected.raw().to_string()),
            violated: raw,
            constraints: origins,
            omitted,
        });
    }
    ConflictReport { conflicts }
}

/// `"<package> <version>"` from the site's source up to a top-level package
fn path(problem: &Problem, settled: &Settled, site: &Site) -> Vec<String> {
    let mut path = Vec::new();
    let mut current = site.source.as_ref().map(|(package, _)| package.clone());
    while let Some(package) = current {
        if path.len() > settled.parents.len() {
            break;
        }
        if let Some(version) = problem.selected(&settled.model, &package) {
            path.push(format!("{package} {}", version.raw()));
        }
        current = settled.parents.get(&package).cloned().flatten();
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::input::InputOptions;
    use versolve_types::{Dependency, PackageConstraint};

    #[test]
    fn test_builds_of_one_version_are_separate_sources() {
        let mut cache = DependencyCache::new();
        cache.add_package_version("a", "1.0.0+x", vec![dep("shared@1.0.0")]).unwrap();
        cache.add_package_version("a", "1.0.0+y", vec![dep("shared@3.0.0")]).unwrap();
        cache.add_package_version("b", "1.0.0", vec![dep("shared@2.0.0")]).unwrap();
        for version in ["1.0.0", "2.0.0", "3.0.0"] {
            cache.add_package_version("shared", version, Vec::new()).unwrap();
        }
        let input = Input::new(["a", "b"], Vec::new(), cache, InputOptions::default()).unwrap();
        let analysis = analyze(&input).unwrap();

        let err = diagnose(&input, &analysis, &SolverOptions::default());
        let Error::Solver(SolverError::Unsatisfiable { report }) = err else {
            panic!("unexpected error: {err}");
        };
        let conflict = &report.conflicts[0];
        assert_eq!(conflict.package, "shared");
        // Only the selected build of `a` contributes its constraint
        let from_a: Vec<&ConstraintOrigin> = conflict
            .constraints
            .iter()
            .filter(|origin| origin.path.first().is_some_and(|p| p.starts_with("a ")))
            .collect();
        assert_eq!(from_a.len(), 1);
        let expected = if from_a[0].path[0] == "a 1.0.0+x" { "1.0.0" } else { "3.0.0" };
        assert_eq!(from_a[0].constraint, expected);
    }

    fn dep(s: &str) -> Dependency {
        s.parse().unwrap()
    }

    #[test]
    fn test_conflict_names_both_sources() {
        let mut cache = DependencyCache::new();
        cache.add_package_version("a", "1.0.0", vec![dep("shared@1.0.0")]).unwrap();
        cache.add_package_version("b", "1.0.0", vec![dep("shared@2.0.0")]).unwrap();
        cache.add_package_version("shared", "1.0.0", Vec::new()).unwrap();
        cache.add_package_version("shared", "2.0.0", Vec::new()).unwrap();
        let input = Input::new(["a", "b"], Vec::new(), cache, InputOptions::default()).unwrap();
        let analysis = analyze(&input).unwrap();

        let err = diagnose(&input, &analysis, &SolverOptions::default());
        let report = match &err {
            Error::Solver(SolverError::Unsatisfiable { report }) => report.clone(),
            other => panic!("unexpected error: {other}"),
        };
        assert_eq!(report.conflicts.len(), 1);
        let conflict = &report.conflicts[0];
        assert_eq!(conflict.package, "shared");
        assert_eq!(conflict.selected.as_deref(), Some("1.0.0"));
        assert_eq!(conflict.violated, vec!["2.0.0"]);
        assert_eq!(
            conflict.constraints,
            vec![
                ConstraintOrigin {
                    constraint: "1.0.0".to_string(),
                    path: vec!["a 1.0.0".to_string()],
                },
                ConstraintOrigin {
                    constraint: "2.0.0".to_string(),
                    path: vec!["b 1.0.0".to_string()],
                },
            ]
        );
    }

    #[test]
    fn test_constraint_list_is_capped() {
        let mut cache = DependencyCache::new();
        cache.add_package_version("app", "1.0.0", vec![dep("lib@2.0.0")]).unwrap();
        cache.add_package_version("lib", "1.0.0", Vec::new()).unwrap();
        cache.add_package_version("lib", "2.0.0", Vec::new()).unwrap();
        let constraints = vec![
            PackageConstraint::parse("lib@=1.0.0").unwrap(),
            PackageConstraint::parse("lib@1.0.0").unwrap(),
        ];
        let input = Input::new(["app"], constraints, cache, InputOptions::default()).unwrap();
        let analysis = analyze(&input).unwrap();
        let options = SolverOptions {
            max_constraints_per_package: 1,
            ..SolverOptions::default()
        };

        let err = diagnose(&input, &analysis, &options);
        let Error::Solver(SolverError::Unsatisfiable { report }) = err else {
            panic!("unexpected error: {err}");
        };
        let conflict = &report.conflicts[0];
        assert_eq!(conflict.constraints.len(), 1);
        assert_eq!(conflict.omitted, 2);
        assert!(conflict.constraints[0].path.is_empty());
    }
}
