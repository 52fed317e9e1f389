//! Pre-solve analysis of a request
//!
//! Finds the packages that can appear in an answer, collects the prerelease
//! versions that count as anticipated, and rejects requests whose top-level
//! constraints already rule a package out.

use crate::input::Input;
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::debug;
use versolve_catalog::DependencyCache;
use versolve_errors::{
    ConflictReport, ConstraintOrigin, Error, PackageConflict, SolverError,
};
use versolve_types::{SimpleConstraint, Version, VersionConstraint};

#[derive(Debug, Clone, Default)]
pub(crate) struct Analysis {
    /// Packages reachable from the top level through strong dependencies
    pub reachable: BTreeSet<String>,
    /// Requested prereleases plus every version an `=x.y.z` constraint names
    pub anticipated: BTreeMap<String, BTreeSet<String>>,
}

impl Analysis {
    pub fn is_anticipated(&self, package: &str, version: &Version) -> bool {
        !version.has_prerelease()
            || self
                .anticipated
                .get(package)
                .is_some_and(|set| set.contains(version.version()))
    }
}

/// Whether `version` can satisfy `constraint` at all. "Any reasonable
/// version" only steers away from prereleases, it never forbids them.
pub(crate) fn allows(constraint: &VersionConstraint, version: &Version) -> bool {
    constraint.alternatives().iter().any(|alt| match alt {
        SimpleConstraint::AnyReasonable => true,
        other => other.is_satisfied_by(version, None),
    })
}

pub(crate) fn analyze<C: Borrow<DependencyCache>>(input: &Input<C>) -> Result<Analysis, Error> {
    let cache = input.catalog_cache();

    for package in input.dependencies() {
        if !cache.has_package(package) {
            return Err(SolverError::UnknownRootPackage {
                package: package.clone(),
            }
            .into());
        }
    }

    let mut analysis = Analysis {
        reachable: BTreeSet::new(),
        anticipated: input.options().anticipated_prereleases.clone(),
    };

    let mut queue: VecDeque<&str> = VecDeque::new();
    for package in input.dependencies() {
        if analysis.reachable.insert(package.clone()) {
            queue.push_back(package);
        }
    }
    while let Some(package) = queue.pop_front() {
        for version in cache.versions(package) {
            for dep in cache.get_dependency_map(package, version.raw())? {
                note_exact_versions(&mut analysis.anticipated, dep.package(), dep.constraint.constraint());
                if !dep.weak
                    && cache.has_package(dep.package())
                    && analysis.reachable.insert(dep.package().to_string())
                {
                    queue.push_back(dep.package());
                }
            }
        }
    }
    for constraint in input.constraints() {
        note_exact_versions(&mut analysis.anticipated, constraint.package(), constraint.constraint());
    }

    check_top_level_constraints(input, &analysis)?;

    debug!(
        reachable = analysis.reachable.len(),
        anticipated = analysis.anticipated.len(),
        "analyzed request"
    );
    Ok(analysis)
}

fn note_exact_versions(
    anticipated: &mut BTreeMap<String, BTreeSet<String>>,
    package: &str,
    constraint: &VersionConstraint,
) {
    for version in constraint.exact_versions() {
        if version.has_prerelease() {
            anticipated
                .entry(package.to_string())
                .or_default()
                .insert(version.version().to_string());
        }
    }
}

fn check_top_level_constraints<C: Borrow<DependencyCache>>(
    input: &Input<C>,
    analysis: &Analysis,
) -> Result<(), Error> {
    let cache = input.catalog_cache();
    for package in &analysis.reachable {
        let on_package: Vec<&VersionConstraint> = input
            .constraints()
            .iter()
            .filter(|c| c.package() == package)
            .map(|c| c.constraint())
            .collect();
        if on_package.is_empty() {
            continue;
        }
        let admitted = cache
            .versions(package)
            .iter()
            .any(|version| on_package.iter().all(|c| allows(c, version)));
        if !admitted {
            let conflict = PackageConflict {
                package: package.clone(),
                selected: None,
                violated: Vec::new(),
                constraints: on_package
                    .iter()
                    .map(|c| ConstraintOrigin {
                        constraint: c.raw().to_string(),
                        path: Vec::new(),
                    })
                    .collect(),
                omitted: 0,
            };
            return Err(SolverError::Unsatisfiable {
                report: ConflictReport {
                    conflicts: vec![conflict],
                },
            }
            .into());
        }
    }
    Ok(())
}
