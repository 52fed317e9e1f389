//! Mapping between package versions and SAT variables

use super::{Assignment, Literal, SatSolver, Variable};
use std::collections::BTreeMap;
use versolve_types::Version;

/// Variables of one package: "package is included" and one per version
#[derive(Debug, Clone)]
pub struct PackageVariables {
    pub included: Variable,
    /// Oldest first
    pub versions: Vec<(Version, Variable)>,
}

impl PackageVariables {
    #[must_use]
    pub fn version_var(&self, raw: &str) -> Option<Variable> {
        self.versions
            .iter()
            .find(|(version, _)| version.raw() == raw)
            .map(|&(_, var)| var)
    }

    /// The version selected by a model, if the package is included
    #[must_use]
    pub fn selected<'a>(&'a self, model: &Assignment) -> Option<&'a Version> {
        self.versions
            .iter()
            .find(|&&(_, var)| model.is_true(var))
            .map(|(version, _)| version)
    }
}

/// Maps package versions to SAT variables
#[derive(Debug, Clone, Default)]
pub struct VariableMap {
    packages: BTreeMap<String, PackageVariables>,
}

impl VariableMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate variables for a package and tie them together: the package
    /// is included iff exactly one of its versions is selected.
    pub fn add_package(&mut self, solver: &mut SatSolver, name: &str, versions: &[Version]) {
        if self.packages.contains_key(name) {
            return;
        }
        let included = solver.new_variable();
        let versions: Vec<(Version, Variable)> = versions
            .iter()
            .map(|version| (version.clone(), solver.new_variable()))
            .collect();

        let mut some_version = vec![Literal::negative(included)];
        some_version.extend(versions.iter().map(|&(_, var)| Literal::positive(var)));
        solver.add_clause(some_version);
        for &(_, var) in &versions {
            solver.add_clause(vec![Literal::negative(var), Literal::positive(included)]);
        }
        let version_vars: Vec<Variable> = versions.iter().map(|&(_, var)| var).collect();
        solver.add_at_most_one(&version_vars);

        self.packages
            .insert(name.to_string(), PackageVariables { included, versions });
    }

    #[must_use]
    pub fn package(&self, name: &str) -> Option<&PackageVariables> {
        self.packages.get(name)
    }

    #[must_use]
    pub fn has_package(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// Packages in name order
    pub fn packages(&self) -> impl Iterator<Item = (&str, &PackageVariables)> {
        self.packages.iter().map(|(name, vars)| (name.as_str(), vars))
    }
}
