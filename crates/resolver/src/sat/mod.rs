//! SAT solver for dependency resolution
//!
//! A small DPLL engine sized for package selection problems (hundreds to a
//! few thousand package versions). It supports:
//! - Clauses and at-most-k cardinality constraints
//! - Temporary constraints for probing a single search
//! - Lexicographic minimization by tightening an at-most bound
//! - A periodic nudge callback during search

mod clause;
mod solver;
mod types;
mod variable_map;

pub use clause::{Constraint, Status};
pub use solver::{SatSolver, SolverStats};
pub use types::{Assignment, Literal, TruthValue, Variable};
pub use variable_map::{PackageVariables, VariableMap};
