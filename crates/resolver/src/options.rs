//! Per-call resolve options

use crate::input::InputOptions;
use std::collections::{BTreeMap, BTreeSet};

/// Options for one [`crate::PackagesResolver::resolve`] call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Packages to move to their newest feasible version
    pub upgrade: Vec<String>,
    /// Prerelease versions, per package, that unqualified constraints accept
    pub anticipated_prereleases: BTreeMap<String, BTreeSet<String>>,
    /// The answer of an earlier resolve, to stay close to
    pub previous_solution: Option<BTreeMap<String, String>>,
    pub allow_incompatible_update: bool,
    pub upgrade_indirect_dep_patch_versions: bool,
    /// Overrides the configured default when set
    pub missing_previous_version_is_error: Option<bool>,
    /// Feature packages the build tool provides, with their versions
    pub supported_isobuild_feature_packages: BTreeMap<String, Vec<String>>,
    /// Also enumerate every valid answer
    pub all_answers: bool,
}

impl ResolveOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package to upgrade
    #[must_use]
    pub fn upgrade(mut self, package: impl Into<String>) -> Self {
        self.upgrade.push(package.into());
        self
    }

    /// Allow a prerelease version of a package to satisfy unqualified constraints
    #[must_use]
    pub fn anticipate_prerelease(
        mut self,
        package: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        self.anticipated_prereleases
            .entry(package.into())
            .or_default()
            .insert(version.into());
        self
    }

    #[must_use]
    pub fn with_previous_solution<I, K, V>(mut self, solution: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.previous_solution = Some(
            solution
                .into_iter()
                .map(|(package, version)| (package.into(), version.into()))
                .collect(),
        );
        self
    }

    #[must_use]
    pub fn allow_incompatible_update(mut self, allow: bool) -> Self {
        self.allow_incompatible_update = allow;
        self
    }

    #[must_use]
    pub fn upgrade_indirect_dep_patch_versions(mut self, upgrade: bool) -> Self {
        self.upgrade_indirect_dep_patch_versions = upgrade;
        self
    }

    #[must_use]
    pub fn missing_previous_version_is_error(mut self, is_error: bool) -> Self {
        self.missing_previous_version_is_error = Some(is_error);
        self
    }

    /// Declare a feature package the build tool supports
    #[must_use]
    pub fn with_isobuild_feature<I, S>(mut self, package: impl Into<String>, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_isobuild_feature_packages
            .entry(package.into())
            .or_default()
            .extend(versions.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn all_answers(mut self, all: bool) -> Self {
        self.all_answers = all;
        self
    }

    /// Whether the minimal previous-solution cache is worth trying first
    #[must_use]
    pub fn wants_fast_path(&self) -> bool {
        self.previous_solution.is_some()
            && self.upgrade.is_empty()
            && !self.upgrade_indirect_dep_patch_versions
    }

    /// The part of these options that shapes the request itself
    #[must_use]
    pub fn input_options(&self) -> InputOptions {
        InputOptions {
            upgrade: self.upgrade.clone(),
            anticipated_prereleases: self.anticipated_prereleases.clone(),
            previous_solution: self.previous_solution.clone(),
            allow_incompatible_update: self.allow_incompatible_update,
            upgrade_indirect_dep_patch_versions: self.upgrade_indirect_dep_patch_versions,
        }
    }
}
