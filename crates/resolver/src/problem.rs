//! SAT encoding of a resolve request
//!
//! Every reachable package gets an "included" variable and one variable per
//! version. Constraints become clauses over those variables. In relaxed mode
//! each constraint clause carries its own violation variable, so the problem
//! is always satisfiable and minimizing the violations explains a failure.

use crate::analysis::{allows, Analysis};
use crate::input::Input;
use crate::sat::{Assignment, Constraint, Literal, PackageVariables, SatSolver, Variable, VariableMap};
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, trace};
use versolve_catalog::DependencyCache;
use versolve_errors::Error;
use versolve_types::{Version, VersionConstraint};

/// A version constraint applied to a package, and where it came from
#[derive(Debug, Clone)]
pub(crate) struct Site {
    pub package: String,
    pub constraint: VersionConstraint,
    /// Package version declaring the dependency, `None` at the top level
    pub source: Option<(String, Version)>,
    pub violation: Option<Variable>,
}

/// A package version that depends on a package the catalog does not have
#[derive(Debug, Clone)]
pub(crate) struct Ban {
    pub package: String,
    pub version: Version,
    pub missing: String,
    pub violation: Option<Variable>,
}

/// Result of pinning packages one by one from the top level down
#[derive(Debug, Clone)]
pub(crate) struct Settled {
    pub model: Assignment,
    /// Visited packages and the package that pulled each one in
    pub parents: BTreeMap<String, Option<String>>,
    /// Visit order
    pub order: Vec<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct Problem {
    pub sat: SatSolver,
    pub vars: VariableMap,
    pub sites: Vec<Site>,
    pub bans: Vec<Ban>,
    pub roots: Vec<String>,
}

impl Problem {
    pub fn build<C: Borrow<DependencyCache>>(
        input: &Input<C>,
        analysis: &Analysis,
        relaxed: bool,
        mut sat: SatSolver,
    ) -> Result<Self, Error> {
        let cache = input.catalog_cache();
        let mut vars = VariableMap::new();
        for package in &analysis.reachable {
            vars.add_package(&mut sat, package, cache.versions(package));
        }

        let mut roots: Vec<String> = input.dependencies().to_vec();
        roots.sort();
        roots.dedup();
        for root in &roots {
            if let Some(root_vars) = vars.package(root) {
                sat.add_clause(vec![Literal::positive(root_vars.included)]);
            }
        }

        let mut sites = Vec::new();
        let mut bans = Vec::new();
        let violation = |sat: &mut SatSolver| relaxed.then(|| sat.new_variable());

        for (package, package_vars) in vars.packages() {
            for (version, var) in &package_vars.versions {
                let selected = Literal::negative(*var);
                for dep in cache.get_dependency_map(package, version.raw())? {
                    let Some(target) = vars.package(dep.package()) else {
                        if dep.weak {
                            continue;
                        }
                        let viol = violation(&mut sat);
                        sat.add_clause(with_violation(vec![selected], viol));
                        bans.push(Ban {
                            package: package.to_string(),
                            version: version.clone(),
                            missing: dep.package().to_string(),
                            violation: viol,
                        });
                        continue;
                    };

                    if !dep.weak {
                        sat.add_clause(vec![selected, Literal::positive(target.included)]);
                    }
                    let constraint = dep.constraint.constraint();
                    if constraint.is_any() {
                        continue;
                    }
                    let viol = restrict(&mut sat, target, constraint, Some(selected), &violation);
                    sites.push(Site {
                        package: dep.package().to_string(),
                        constraint: constraint.clone(),
                        source: Some((package.to_string(), version.clone())),
                        violation: viol,
                    });
                }
            }
        }

        for constraint in input.constraints() {
            let Some(target) = vars.package(constraint.package()) else {
                continue;
            };
            if constraint.constraint().is_any() {
                continue;
            }
            let viol = restrict(&mut sat, target, constraint.constraint(), None, &violation);
            sites.push(Site {
                package: constraint.package().to_string(),
                constraint: constraint.constraint().clone(),
                source: None,
                violation: viol,
            });
        }

        debug!(
            relaxed,
            variables = sat.num_variables(),
            constraints = sat.num_constraints(),
            sites = sites.len(),
            bans = bans.len(),
            "encoded problem"
        );
        Ok(Self {
            sat,
            vars,
            sites,
            bans,
            roots,
        })
    }

    /// Violation variables of a relaxed problem
    pub fn violations(&self) -> Vec<Literal> {
        let from_sites = self.sites.iter().filter_map(|site| site.violation);
        let from_bans = self.bans.iter().filter_map(|ban| ban.violation);
        from_sites.chain(from_bans).map(Literal::positive).collect()
    }

    /// Version of `package` selected by `model`
    pub fn selected<'a>(&'a self, model: &Assignment, package: &str) -> Option<&'a Version> {
        self.vars.package(package).and_then(|vars| vars.selected(model))
    }

    /// Walk the packages breadth-first from the roots, pinning each to the
    /// first candidate in `prefer` order that keeps the problem satisfiable.
    /// Packages the walk never reaches are excluded.
    pub fn settle<F>(
        &mut self,
        cache: &DependencyCache,
        mut model: Assignment,
        prefer: F,
    ) -> Result<Settled, Error>
    where
        F: Fn(&str, &PackageVariables) -> Vec<Variable>,
    {
        let mut parents: BTreeMap<String, Option<String>> = BTreeMap::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        for root in &self.roots {
            if self.vars.has_package(root) {
                parents.insert(root.clone(), None);
                queue.push_back(root.clone());
            }
        }

        let mut order = Vec::new();
        while let Some(package) = queue.pop_front() {
            let Some(package_vars) = self.vars.package(&package) else {
                continue;
            };
            let candidates = prefer(&package, package_vars);

            let mut chosen = None;
            for var in candidates {
                if model.is_true(var) {
                    chosen = Some(var);
                    break;
                }
                if let Some(found) = self
                    .sat
                    .solve_assuming(vec![Constraint::unit(Literal::positive(var))])
                {
                    model = found;
                    chosen = Some(var);
                    break;
                }
            }
            let var = chosen.ok_or_else(|| {
                Error::internal(format!("no selectable version of {package}"))
            })?;
            self.sat.add_clause(vec![Literal::positive(var)]);

            let Some(version) = self.selected(&model, &package).cloned() else {
                return Err(Error::internal(format!("{package} pinned but not selected")));
            };
            trace!(package, version = version.raw(), "pinned");

            let mut next: Vec<&str> = cache
                .get_dependency_map(&package, version.raw())?
                .iter()
                .filter(|dep| !dep.weak && self.vars.has_package(dep.package()))
                .map(|dep| dep.package())
                .collect();
            next.sort_unstable();
            for dep in next {
                if !parents.contains_key(dep) {
                    parents.insert(dep.to_string(), Some(package.clone()));
                    queue.push_back(dep.to_string());
                }
            }
            order.push(package);
        }

        let unvisited: Vec<Variable> = self
            .vars
            .packages()
            .filter(|(name, _)| !parents.contains_key(*name))
            .map(|(_, vars)| vars.included)
            .collect();
        for included in unvisited {
            self.sat.add_clause(vec![Literal::negative(included)]);
        }

        let model = self
            .sat
            .solve()
            .ok_or_else(|| Error::internal("settled problem became unsatisfiable"))?;
        Ok(Settled {
            model,
            parents,
            order,
        })
    }

    /// Packages reachable from the roots through the strong dependencies of
    /// the versions `model` selects
    pub fn closure(
        &self,
        cache: &DependencyCache,
        model: &Assignment,
    ) -> Result<BTreeMap<String, (Version, Variable)>, Error> {
        let mut closure = BTreeMap::new();
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        for root in &self.roots {
            if seen.insert(root) {
                queue.push_back(root);
            }
        }
        while let Some(package) = queue.pop_front() {
            let Some(package_vars) = self.vars.package(package) else {
                continue;
            };
            let Some((version, var)) = package_vars
                .versions
                .iter()
                .find(|&&(_, var)| model.is_true(var))
            else {
                continue;
            };
            closure.insert(package.to_string(), (version.clone(), *var));
            for dep in cache.get_dependency_map(package, version.raw())? {
                if !dep.weak && seen.insert(dep.package()) {
                    queue.push_back(dep.package());
                }
            }
        }
        Ok(closure)
    }
}

fn with_violation(mut clause: Vec<Literal>, violation: Option<Variable>) -> Vec<Literal> {
    if let Some(var) = violation {
        clause.push(Literal::positive(var));
    }
    clause
}

/// Limit `target` to the versions `constraint` allows, when `source` holds.
/// Returns the violation variable, if one was attached.
fn restrict(
    sat: &mut SatSolver,
    target: &PackageVariables,
    constraint: &VersionConstraint,
    source: Option<Literal>,
    violation: &impl Fn(&mut SatSolver) -> Option<Variable>,
) -> Option<Variable> {
    let allowed: Vec<Literal> = target
        .versions
        .iter()
        .filter(|(version, _)| allows(constraint, version))
        .map(|&(_, var)| Literal::positive(var))
        .collect();
    if allowed.len() == target.versions.len() {
        return None;
    }

    let mut clause: Vec<Literal> = source.into_iter().collect();
    clause.push(Literal::negative(target.included));
    clause.extend(allowed);
    let viol = violation(sat);
    sat.add_clause(with_violation(clause, viol));
    viol
}
