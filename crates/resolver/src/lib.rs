#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Dependency resolution for versolve
//!
//! This crate turns a set of top-level packages and version constraints into
//! one version per package. Requests are encoded as a satisfiability problem
//! over the dependency cache; among the valid answers the solver prefers
//! stability with a previous answer, then the caller's upgrade requests, then
//! a deterministic per-package order. Requests without an answer produce a
//! conflict report tracing each constraint back to the top level.

mod analysis;
mod diagnostics;
mod hooks;
mod input;
mod options;
mod problem;
mod resolver;
mod sat;
mod solver;

pub use hooks::{Nudge, Profile};
pub use input::{Input, InputOptions};
pub use options::ResolveOptions;
pub use resolver::{resolve_with_input, PackagesResolver, ResolverOptions, SolveOutcome};
pub use sat::{Assignment, Constraint, Literal, SatSolver, SolverStats, Status, TruthValue, Variable};
pub use solver::{ResolveOutput, Solver, SolverAnswer, SolverOptions};
