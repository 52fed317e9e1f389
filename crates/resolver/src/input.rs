//! The canonical form of one resolve request

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::borrow::{Borrow, BorrowMut};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;
use versolve_catalog::{Catalog, CatalogLoader, DependencyCache};
use versolve_errors::Error;
use versolve_types::{validate_package_name, PackageConstraint, Version};

/// Request options that shape the answer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputOptions {
    /// Packages whose newest version wins over stability
    pub upgrade: Vec<String>,
    /// Prerelease versions, per package, allowed to satisfy unqualified constraints
    pub anticipated_prereleases: BTreeMap<String, BTreeSet<String>>,
    /// A prior answer to stay close to
    pub previous_solution: Option<BTreeMap<String, String>>,
    /// Let top-level packages move to versions incompatible with the previous answer
    pub allow_incompatible_update: bool,
    /// Move indirect dependencies to the newest patch of their previous minor
    pub upgrade_indirect_dep_patch_versions: bool,
}

impl InputOptions {
    #[must_use]
    pub fn is_upgrading(&self, package: &str) -> bool {
        self.upgrade.iter().any(|p| p == package)
    }

    #[must_use]
    pub fn previous_version(&self, package: &str) -> Option<&str> {
        self.previous_solution
            .as_ref()
            .and_then(|solution| solution.get(package))
            .map(String::as_str)
    }
}

/// One resolve request: top-level packages, constraints, options and the
/// dependency cache to solve against.
///
/// `C` lets the request either own its cache or borrow the long-lived cache
/// of a resolver.
#[derive(Debug, Clone)]
pub struct Input<C = DependencyCache> {
    dependencies: Vec<String>,
    constraints: Vec<PackageConstraint>,
    catalog_cache: C,
    options: InputOptions,
}

impl<C: Borrow<DependencyCache>> Input<C> {
    /// Build a request, validating package names and previous versions
    ///
    /// # Errors
    ///
    /// Returns an error if a dependency or upgrade name is not a valid package
    /// name or a previous-solution version does not parse.
    pub fn new<I, S>(
        dependencies: I,
        constraints: Vec<PackageConstraint>,
        catalog_cache: C,
        options: InputOptions,
    ) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dependencies: Vec<String> = dependencies.into_iter().map(Into::into).collect();
        for name in dependencies.iter().chain(&options.upgrade) {
            validate_package_name(name)?;
        }
        if let Some(previous) = &options.previous_solution {
            for (package, version) in previous {
                validate_package_name(package)?;
                Version::parse(version)?;
            }
        }
        Ok(Self {
            dependencies,
            constraints,
            catalog_cache,
            options,
        })
    }

    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    #[must_use]
    pub fn constraints(&self) -> &[PackageConstraint] {
        &self.constraints
    }

    #[must_use]
    pub fn catalog_cache(&self) -> &DependencyCache {
        self.catalog_cache.borrow()
    }

    #[must_use]
    pub fn options(&self) -> &InputOptions {
        &self.options
    }

    #[must_use]
    pub fn is_root(&self, package: &str) -> bool {
        self.dependencies.iter().any(|p| p == package)
    }

    /// Serialize without the catalog cache
    ///
    /// Requests resolved against the same long-lived cache are equal iff
    /// their keys are equal.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn request_key(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(&self.view(false))?)
    }

    /// Whether two requests ask for the same thing
    #[must_use]
    pub fn is_equal<D: Borrow<DependencyCache>>(&self, other: &Input<D>) -> bool {
        matches!(
            (self.request_key(), other.request_key()),
            (Ok(a), Ok(b)) if a == b
        )
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    /// Copy into a request that owns its cache
    #[must_use]
    pub fn to_owned_input(&self) -> Input<DependencyCache> {
        Input {
            dependencies: self.dependencies.clone(),
            constraints: self.constraints.clone(),
            catalog_cache: self.catalog_cache().clone(),
            options: self.options.clone(),
        }
    }

    fn view(&self, with_cache: bool) -> InputView<'_> {
        InputView {
            dependencies: &self.dependencies,
            constraints: &self.constraints,
            catalog_cache: with_cache.then(|| self.catalog_cache()),
            upgrade: &self.options.upgrade,
            anticipated_prereleases: AnticipatedView(&self.options.anticipated_prereleases),
            previous_solution: self.options.previous_solution.as_ref(),
            allow_incompatible_update: self.options.allow_incompatible_update,
            upgrade_indirect_dep_patch_versions: self.options.upgrade_indirect_dep_patch_versions,
        }
    }
}

impl<C: BorrowMut<DependencyCache>> Input<C> {
    /// Add dependency-free entries for build-tool feature packages, skipping
    /// versions already present. Returns the number of entries added.
    ///
    /// # Errors
    ///
    /// Returns an error if a feature version does not parse.
    pub fn add_feature_packages(
        &mut self,
        features: &BTreeMap<String, Vec<String>>,
    ) -> Result<usize, Error> {
        let cache = self.catalog_cache.borrow_mut();
        let mut added = 0;
        for (package, versions) in features {
            for version in versions {
                if !cache.has_package_version(package, version) {
                    cache.add_package_version(package, version, Vec::new())?;
                    added += 1;
                }
            }
        }
        Ok(added)
    }

    /// Load just the versions named by the previous solution. Returns the
    /// number of entries added.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog fails or returns malformed records.
    pub fn load_only_previous_solution<K: Catalog>(
        &mut self,
        loader: &mut CatalogLoader<K>,
    ) -> Result<usize, Error> {
        let Some(previous) = &self.options.previous_solution else {
            return Ok(0);
        };
        let cache = self.catalog_cache.borrow_mut();
        let mut added = 0;
        for (package, version) in previous {
            if loader.load_single_version(cache, package, version)? {
                added += 1;
            }
        }
        debug!(requested = previous.len(), added, "loaded previous solution");
        Ok(added)
    }

    /// Load every version of every package reachable from the request.
    /// Returns the number of entries added.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog fails or returns malformed records.
    pub fn load_from_catalog<K: Catalog>(
        &mut self,
        loader: &mut CatalogLoader<K>,
    ) -> Result<usize, Error> {
        let mut packages: Vec<&str> = self.dependencies.iter().map(String::as_str).collect();
        packages.extend(self.constraints.iter().map(PackageConstraint::package));
        if let Some(previous) = &self.options.previous_solution {
            packages.extend(previous.keys().map(String::as_str));
        }
        let added = loader.load_all_versions_recursive(self.catalog_cache.borrow_mut(), packages)?;
        debug!(added, total = self.catalog_cache().len(), "loaded from catalog");
        Ok(added)
    }
}

impl Input<DependencyCache> {
    /// Parse the serialized request form
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or holds invalid names,
    /// constraints, versions or cache entries.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let data: InputData = serde_json::from_str(json)?;
        data.into_input()
    }

    /// Give up the request, keeping its cache
    #[must_use]
    pub fn into_catalog_cache(self) -> DependencyCache {
        self.catalog_cache
    }
}

impl<C: Borrow<DependencyCache>> Serialize for Input<C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.view(true).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Input<DependencyCache> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        InputData::deserialize(deserializer)?
            .into_input()
            .map_err(serde::de::Error::custom)
    }
}

/// Field order and omissions of the serialized form
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InputView<'a> {
    dependencies: &'a [String],
    constraints: &'a [PackageConstraint],
    #[serde(skip_serializing_if = "Option::is_none")]
    catalog_cache: Option<&'a DependencyCache>,
    #[serde(skip_serializing_if = "no_upgrades")]
    upgrade: &'a [String],
    #[serde(skip_serializing_if = "AnticipatedView::is_empty")]
    anticipated_prereleases: AnticipatedView<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_solution: Option<&'a BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "is_false")]
    allow_incompatible_update: bool,
    #[serde(skip_serializing_if = "is_false")]
    upgrade_indirect_dep_patch_versions: bool,
}

#[allow(clippy::ref_option_ref, clippy::trivially_copy_pass_by_ref)]
fn no_upgrades(upgrade: &&[String]) -> bool {
    upgrade.is_empty()
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

/// `{pkg: {version: true}}`
struct AnticipatedView<'a>(&'a BTreeMap<String, BTreeSet<String>>);

impl AnticipatedView<'_> {
    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for AnticipatedView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (package, versions) in self.0 {
            let flags: BTreeMap<&str, bool> =
                versions.iter().map(|v| (v.as_str(), true)).collect();
            map.serialize_entry(package, &flags)?;
        }
        map.end()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputData {
    dependencies: Vec<String>,
    constraints: Vec<String>,
    #[serde(default)]
    catalog_cache: DependencyCache,
    #[serde(default)]
    upgrade: Vec<String>,
    #[serde(default)]
    anticipated_prereleases: BTreeMap<String, BTreeMap<String, bool>>,
    #[serde(default)]
    previous_solution: Option<BTreeMap<String, String>>,
    #[serde(default)]
    allow_incompatible_update: bool,
    #[serde(default)]
    upgrade_indirect_dep_patch_versions: bool,
}

impl InputData {
    fn into_input(self) -> Result<Input<DependencyCache>, Error> {
        let constraints = self
            .constraints
            .iter()
            .map(|c| PackageConstraint::parse(c))
            .collect::<Result<Vec<_>, _>>()?;
        let anticipated_prereleases = self
            .anticipated_prereleases
            .into_iter()
            .map(|(package, versions)| {
                let allowed: BTreeSet<String> = versions
                    .into_iter()
                    .filter_map(|(version, allowed)| allowed.then_some(version))
                    .collect();
                (package, allowed)
            })
            .filter(|(_, versions)| !versions.is_empty())
            .collect();
        Input::new(
            self.dependencies,
            constraints,
            self.catalog_cache,
            InputOptions {
                upgrade: self.upgrade,
                anticipated_prereleases,
                previous_solution: self.previous_solution,
                allow_incompatible_update: self.allow_incompatible_update,
                upgrade_indirect_dep_patch_versions: self.upgrade_indirect_dep_patch_versions,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use versolve_catalog::InMemoryCatalog;

    fn constraint(s: &str) -> PackageConstraint {
        PackageConstraint::parse(s).unwrap()
    }

    #[test]
    fn test_defaults_are_omitted() {
        let input = Input::new(
            ["foo"],
            vec![constraint("foo@1.0.0")],
            DependencyCache::new(),
            InputOptions::default(),
        )
        .unwrap();
        assert_eq!(
            input.to_json().unwrap(),
            r#"{"dependencies":["foo"],"constraints":["foo@1.0.0"],"catalogCache":{"data":{}}}"#
        );
        assert_eq!(
            input.request_key().unwrap(),
            r#"{"dependencies":["foo"],"constraints":["foo@1.0.0"]}"#
        );
    }

    #[test]
    fn test_equality_ignores_cache() {
        let mut cache = DependencyCache::new();
        cache.add_package_version("foo", "1.0.0", Vec::new()).unwrap();
        let a = Input::new(["foo"], Vec::new(), cache, InputOptions::default()).unwrap();
        let b = Input::new(["foo"], Vec::new(), DependencyCache::new(), InputOptions::default())
            .unwrap();
        assert!(a.is_equal(&b));

        let upgrading = Input::new(
            ["foo"],
            Vec::new(),
            DependencyCache::new(),
            InputOptions {
                upgrade: vec!["foo".to_string()],
                ..InputOptions::default()
            },
        )
        .unwrap();
        assert!(!a.is_equal(&upgrading));
    }

    #[test]
    fn test_invalid_names_rejected() {
        assert!(Input::new(
            ["Foo"],
            Vec::new(),
            DependencyCache::new(),
            InputOptions::default()
        )
        .is_err());
        let bad_previous = InputOptions {
            previous_solution: Some(BTreeMap::from([(
                "foo".to_string(),
                "1.0".to_string(),
            )])),
            ..InputOptions::default()
        };
        assert!(Input::new(["foo"], Vec::new(), DependencyCache::new(), bad_previous).is_err());
    }

    #[test]
    fn test_loading_modes() {
        let catalog = InMemoryCatalog::from_json(
            r#"[
                {"packageName": "app", "version": "1.0.0",
                 "dependencies": {"lib": {"constraint": "1.0.0"}}},
                {"packageName": "app", "version": "2.0.0", "dependencies": {}},
                {"packageName": "lib", "version": "1.0.0", "dependencies": {}}
            ]"#,
        )
        .unwrap();
        let mut loader = CatalogLoader::new(&catalog);
        let mut cache = DependencyCache::new();
        let mut input = Input::new(
            ["app"],
            Vec::new(),
            &mut cache,
            InputOptions {
                previous_solution: Some(BTreeMap::from([
                    ("app".to_string(), "1.0.0".to_string()),
                    ("gone".to_string(), "1.0.0".to_string()),
                ])),
                ..InputOptions::default()
            },
        )
        .unwrap();

        assert_eq!(input.load_only_previous_solution(&mut loader).unwrap(), 1);
        assert_eq!(input.catalog_cache().get_package_versions("app"), vec!["1.0.0"]);
        assert!(!input.catalog_cache().has_package("lib"));

        assert_eq!(input.load_from_catalog(&mut loader).unwrap(), 2);
        assert_eq!(
            input.catalog_cache().get_package_versions("app"),
            vec!["1.0.0", "2.0.0"]
        );
        assert!(input.catalog_cache().has_package_version("lib", "1.0.0"));
        assert_eq!(cache.len(), 3);
    }
}
