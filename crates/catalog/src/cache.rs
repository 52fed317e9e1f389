//! In-memory dependency cache
//!
//! Append-only index of `(package, version) -> dependencies`. Versions of a
//! package are kept sorted by version order; entries remember insertion order
//! so the serialized form round-trips exactly.

use serde::de::{MapAccess, Visitor};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::ControlFlow;
use versolve_errors::{CatalogError, Error};
use versolve_types::{Dependency, PackageAndVersion, Version};

/// Dependencies of one package version, keyed by target package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyMap {
    deps: Vec<Dependency>,
}

impl DependencyMap {
    #[must_use]
    pub fn get(&self, package: &str) -> Option<&Dependency> {
        self.deps.iter().find(|dep| dep.package() == package)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Dependency> {
        self.deps.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.deps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }
}

impl FromIterator<Dependency> for DependencyMap {
    /// A later dependency on the same package replaces the earlier one.
    fn from_iter<I: IntoIterator<Item = Dependency>>(iter: I) -> Self {
        let mut deps: Vec<Dependency> = Vec::new();
        for dep in iter {
            match deps.iter_mut().find(|d| d.package() == dep.package()) {
                Some(existing) => *existing = dep,
                None => deps.push(dep),
            }
        }
        Self { deps }
    }
}

impl<'a> IntoIterator for &'a DependencyMap {
    type Item = &'a Dependency;
    type IntoIter = std::slice::Iter<'a, Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.deps.iter()
    }
}

impl Serialize for DependencyMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.deps)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    key: PackageAndVersion,
    dependencies: DependencyMap,
}

#[derive(Debug, Clone, Default)]
struct PackageVersions {
    /// Sorted ascending
    sorted: Vec<Version>,
    /// Raw version string -> index into `DependencyCache::entries`
    entries: HashMap<String, usize>,
}

/// Queryable index of catalog data
#[derive(Debug, Clone, Default)]
pub struct DependencyCache {
    entries: Vec<Entry>,
    packages: BTreeMap<String, PackageVersions>,
}

impl DependencyCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the dependencies of one package version
    ///
    /// # Errors
    ///
    /// Returns an error if the version string does not parse or the pair is
    /// already present.
    pub fn add_package_version(
        &mut self,
        package: &str,
        version: &str,
        dependencies: impl IntoIterator<Item = Dependency>,
    ) -> Result<(), Error> {
        if self.has_package_version(package, version) {
            return Err(CatalogError::DuplicateEntry {
                package: package.to_string(),
                version: version.to_string(),
            }
            .into());
        }
        let parsed = Version::parse(version)?;

        let index = self.entries.len();
        self.entries.push(Entry {
            key: PackageAndVersion::new(package, version),
            dependencies: dependencies.into_iter().collect(),
        });

        let versions = self.packages.entry(package.to_string()).or_default();
        let position = versions
            .sorted
            .binary_search(&parsed)
            .unwrap_or_else(|insert_at| insert_at);
        versions.sorted.insert(position, parsed);
        versions.entries.insert(version.to_string(), index);
        Ok(())
    }

    #[must_use]
    pub fn has_package_version(&self, package: &str, version: &str) -> bool {
        self.packages
            .get(package)
            .is_some_and(|versions| versions.entries.contains_key(version))
    }

    #[must_use]
    pub fn has_package(&self, package: &str) -> bool {
        self.packages.contains_key(package)
    }

    /// Version strings of a package, oldest first. Empty for unknown packages.
    #[must_use]
    pub fn get_package_versions(&self, package: &str) -> Vec<&str> {
        self.versions(package).iter().map(Version::raw).collect()
    }

    /// Parsed versions of a package, oldest first
    #[must_use]
    pub fn versions(&self, package: &str) -> &[Version] {
        self.packages
            .get(package)
            .map_or(&[], |versions| versions.sorted.as_slice())
    }

    /// # Errors
    ///
    /// Returns `CatalogError::UnknownVersion` if the pair is not present.
    pub fn get_dependency_map(&self, package: &str, version: &str) -> Result<&DependencyMap, Error> {
        self.packages
            .get(package)
            .and_then(|versions| versions.entries.get(version))
            .map(|&index| &self.entries[index].dependencies)
            .ok_or_else(|| {
                CatalogError::UnknownVersion {
                    package: package.to_string(),
                    version: version.to_string(),
                }
                .into()
            })
    }

    /// Visit every package version: packages by name, versions oldest first.
    /// The visitor breaks to stop early.
    #[must_use]
    pub fn each_package_version<F>(&self, mut visit: F) -> ControlFlow<()>
    where
        F: FnMut(&str, &Version, &DependencyMap) -> ControlFlow<()>,
    {
        for (package, versions) in &self.packages {
            for version in &versions.sorted {
                let index = versions.entries[version.raw()];
                visit(package, version, &self.entries[index].dependencies)?;
            }
        }
        ControlFlow::Continue(())
    }

    /// Visit every package with its sorted versions. The visitor breaks to stop early.
    #[must_use]
    pub fn each_package<F>(&self, mut visit: F) -> ControlFlow<()>
    where
        F: FnMut(&str, &[Version]) -> ControlFlow<()>,
    {
        for (package, versions) in &self.packages {
            visit(package, &versions.sorted)?;
        }
        ControlFlow::Continue(())
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&PackageAndVersion, &DependencyMap)> {
        self.entries
            .iter()
            .map(|entry| (&entry.key, &entry.dependencies))
    }

    /// Package names, sorted
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    /// Number of package versions
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the `{ "data": { "<pkg> <version>": [deps] } }` JSON form
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or holds invalid entries.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| {
            CatalogError::MalformedEntry {
                entry: "<dependency cache>".to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }
}

struct EntriesInOrder<'a>(&'a [Entry]);

impl Serialize for EntriesInOrder<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in self.0 {
            map.serialize_entry(&entry.key, &entry.dependencies)?;
        }
        map.end()
    }
}

impl Serialize for DependencyCache {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DependencyCache", 1)?;
        state.serialize_field("data", &EntriesInOrder(&self.entries))?;
        state.end()
    }
}

/// Map entries in document order
struct OrderedEntries(Vec<(PackageAndVersion, Vec<Dependency>)>);

impl<'de> Deserialize<'de> for OrderedEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = OrderedEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from \"<package> <version>\" to dependency strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry()? {
                    entries.push(entry);
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

#[derive(Deserialize)]
struct SerializedCache {
    data: OrderedEntries,
}

impl<'de> Deserialize<'de> for DependencyCache {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let SerializedCache { data } = SerializedCache::deserialize(deserializer)?;
        let mut cache = DependencyCache::new();
        for (key, deps) in data.0 {
            cache
                .add_package_version(&key.package, &key.version, deps)
                .map_err(serde::de::Error::custom)?;
        }
        Ok(cache)
    }
}
