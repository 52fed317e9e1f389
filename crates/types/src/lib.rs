#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the versolve dependency resolver
//!
//! This crate provides the version grammar and its total ordering, version
//! and package constraints, and the identity types shared by the catalog and
//! the solver.

pub mod constraint;
pub mod package;
pub mod version;

// Re-export commonly used types
pub use constraint::{
    invalid_first_format_constraint, PackageConstraint, SimpleConstraint, VersionConstraint,
};
pub use package::{validate_package_name, Dependency, PackageAndVersion};
pub use version::{compare, less_than, version_magnitude, PrereleasePart, Version};
