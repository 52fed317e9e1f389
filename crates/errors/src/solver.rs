//! Solver error types and structured conflict reports

use std::borrow::Cow;
use std::fmt;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum SolverError {
    #[error("unknown package in top-level dependencies: {package}")]
    UnknownRootPackage { package: String },

    #[error("unknown package: {package} (required by {required_by})")]
    UnknownPackage { package: String, required_by: String },

    #[error("Package version not in catalog: {package} {version}")]
    MissingPreviousVersion { package: String, version: String },

    #[error("{report}")]
    Unsatisfiable { report: ConflictReport },
}

impl SolverError {
    /// True for outcomes that only mean "no answer with this catalog data".
    #[must_use]
    pub fn is_infeasible(&self) -> bool {
        matches!(
            self,
            Self::Unsatisfiable { .. }
                | Self::UnknownPackage { .. }
                | Self::UnknownRootPackage { .. }
        )
    }

    /// Structured conflict data, when the failure is an unsatisfiable problem
    #[must_use]
    pub fn conflict_report(&self) -> Option<&ConflictReport> {
        match self {
            Self::Unsatisfiable { report } => Some(report),
            _ => None,
        }
    }
}

impl UserFacingError for SolverError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::UnknownRootPackage { .. } | Self::UnknownPackage { .. } => {
                Some("Check the package name for typos or refresh the catalog.")
            }
            Self::MissingPreviousVersion { .. } => {
                Some("Refresh the catalog or drop the stale entry from the previous solution.")
            }
            Self::Unsatisfiable { .. } => {
                Some("Relax one of the listed constraints or pick different top-level versions.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::UnknownRootPackage { .. } => "solver.unknown_root_package",
            Self::UnknownPackage { .. } => "solver.unknown_package",
            Self::MissingPreviousVersion { .. } => "solver.missing_previous_version",
            Self::Unsatisfiable { .. } => "solver.unsatisfiable",
        };
        Some(code)
    }
}

/// Why no assignment exists, grouped per conflicting package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConflictReport {
    pub conflicts: Vec<PackageConflict>,
}

/// Every constraint applied to one package that could not be satisfied
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PackageConflict {
    pub package: String,
    /// Version picked for the package by the closest relaxed answer. `None`
    /// when the top-level constraints alone admit no version.
    pub selected: Option<String>,
    /// Raw constraint strings the selected version violates
    pub violated: Vec<String>,
    pub constraints: Vec<ConstraintOrigin>,
    /// Distinct constraint lines left out of `constraints`
    pub omitted: usize,
}

/// A constraint on a package and the chain that introduced it
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstraintOrigin {
    /// Raw version constraint, empty for "any reasonable version"
    pub constraint: String,
    /// `"<package> <version>"` entries from the constraint's source up to a
    /// top-level package. Empty for top-level constraints.
    pub path: Vec<String>,
}

impl ConflictReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Names of the packages involved
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.conflicts.iter().map(|c| c.package.as_str())
    }
}

fn qualified(package: &str, constraint: &str) -> String {
    if constraint.is_empty() {
        package.to_string()
    } else {
        format!("{package}@{constraint}")
    }
}

impl fmt::Display for PackageConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(selected) = &self.selected else {
            let listed: Vec<String> = self
                .constraints
                .iter()
                .map(|origin| format!("@{}", origin.constraint))
                .collect();
            return write!(
                f,
                "No version of {} satisfies all constraints: {}",
                self.package,
                listed.join(", ")
            );
        };

        for constraint in &self.violated {
            writeln!(
                f,
                "Conflict: Constraint {} is not satisfied by {} {}.",
                qualified(&self.package, constraint),
                self.package,
                selected
            )?;
        }
        write!(f, "Constraints on package \"{}\":", self.package)?;
        for origin in &self.constraints {
            let source = if origin.path.is_empty() {
                "top level".to_string()
            } else {
                origin.path.join(" <- ")
            };
            write!(
                f,
                "\n* {} <- {}",
                qualified(&self.package, &origin.constraint),
                source
            )?;
        }
        if self.omitted > 0 {
            write!(f, "\n...and {} more", self.omitted)?;
        }
        Ok(())
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, conflict) in self.conflicts.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{conflict}")?;
        }
        Ok(())
    }
}
