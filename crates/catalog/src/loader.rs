//! Pulls catalog records into a [`DependencyCache`]

use crate::cache::DependencyCache;
use crate::models::VersionRecord;
use crate::Catalog;
use std::collections::{BTreeSet, HashMap, VecDeque};
use tracing::{debug, trace};
use versolve_errors::Error;

/// Loads package versions from a catalog on demand.
///
/// Sorted record lists are memoized per package for the lifetime of the
/// loader, so repeated loads of the same package hit the catalog once.
#[derive(Debug)]
pub struct CatalogLoader<C> {
    catalog: C,
    sorted_records: HashMap<String, Vec<VersionRecord>>,
}

impl<C: Catalog> CatalogLoader<C> {
    #[must_use]
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            sorted_records: HashMap::new(),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    fn sorted_version_records(&mut self, package: &str) -> Result<&[VersionRecord], Error> {
        if !self.sorted_records.contains_key(package) {
            let records = self.catalog.get_sorted_version_records(package)?;
            trace!(package, versions = records.len(), "fetched version records");
            self.sorted_records.insert(package.to_string(), records);
        }
        Ok(self
            .sorted_records
            .get(package)
            .map_or(&[], Vec::as_slice))
    }

    /// Load one version unless the cache already has it. Returns whether an
    /// entry was added; versions the catalog does not know are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog fails or the record is malformed.
    pub fn load_single_version(
        &mut self,
        cache: &mut DependencyCache,
        package: &str,
        version: &str,
    ) -> Result<bool, Error> {
        if cache.has_package_version(package, version) {
            return Ok(false);
        }

        let record = match self.sorted_records.get(package) {
            Some(records) => records.iter().find(|r| r.version == version).cloned(),
            None => self.catalog.get_version(package, version)?,
        };
        let Some(record) = record else {
            trace!(package, version, "version not in catalog");
            return Ok(false);
        };

        cache.add_package_version(package, version, record.to_dependencies()?)?;
        Ok(true)
    }

    /// Load every version of a package. Returns the number of entries added.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog fails or a record is malformed.
    pub fn load_all_versions(
        &mut self,
        cache: &mut DependencyCache,
        package: &str,
    ) -> Result<usize, Error> {
        let mut added = 0;
        for record in self.sorted_version_records(package)? {
            if cache.has_package_version(package, &record.version) {
                continue;
            }
            cache.add_package_version(package, &record.version, record.to_dependencies()?)?;
            added += 1;
        }
        Ok(added)
    }

    /// Load every version of the given packages and of everything they can
    /// reach through any dependency, weak or strong.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog fails or a record is malformed.
    pub fn load_all_versions_recursive<I, S>(
        &mut self,
        cache: &mut DependencyCache,
        packages: I,
    ) -> Result<usize, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut queue: VecDeque<String> = VecDeque::new();
        let mut seen: BTreeSet<String> = BTreeSet::new();
        for package in packages {
            let package = package.as_ref();
            if seen.insert(package.to_string()) {
                queue.push_back(package.to_string());
            }
        }

        let mut added = 0;
        while let Some(package) = queue.pop_front() {
            added += self.load_all_versions(cache, &package)?;
            for version in cache.get_package_versions(&package) {
                for dep in cache.get_dependency_map(&package, version)? {
                    if seen.insert(dep.package().to_string()) {
                        queue.push_back(dep.package().to_string());
                    }
                }
            }
        }

        debug!(
            packages = seen.len(),
            added,
            cached = cache.len(),
            "loaded catalog closure"
        );
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryCatalog;
    use std::cell::Cell;

    /// Counts catalog calls to check memoization
    struct CountingCatalog {
        inner: InMemoryCatalog,
        sorted_calls: Cell<usize>,
    }

    impl Catalog for CountingCatalog {
        fn get_sorted_version_records(&self, package: &str) -> Result<Vec<VersionRecord>, Error> {
            self.sorted_calls.set(self.sorted_calls.get() + 1);
            self.inner.get_sorted_version_records(package)
        }

        fn get_version(&self, package: &str, version: &str) -> Result<Option<VersionRecord>, Error> {
            self.inner.get_version(package, version)
        }
    }

    fn catalog() -> InMemoryCatalog {
        let mut catalog = InMemoryCatalog::new();
        for record in [
            VersionRecord::new("app", "1.0.0").with_dependency("lib@1.0.0").unwrap(),
            VersionRecord::new("app", "2.0.0")
                .with_dependency("lib@2.0.0")
                .unwrap()
                .with_dependency("?extra")
                .unwrap(),
            VersionRecord::new("lib", "1.0.0"),
            VersionRecord::new("lib", "2.0.0"),
            VersionRecord::new("extra", "0.1.0"),
            VersionRecord::new("unrelated", "1.0.0"),
        ] {
            catalog.add_record(record).unwrap();
        }
        catalog
    }

    #[test]
    fn test_load_single_version() {
        let mut loader = CatalogLoader::new(catalog());
        let mut cache = DependencyCache::new();
        assert!(loader.load_single_version(&mut cache, "app", "1.0.0").unwrap());
        assert!(!loader.load_single_version(&mut cache, "app", "1.0.0").unwrap());
        assert!(!loader.load_single_version(&mut cache, "app", "9.9.9").unwrap());
        assert_eq!(cache.len(), 1);
        assert!(!cache.has_package("lib"));
    }

    #[test]
    fn test_recursive_load_follows_weak_edges() {
        let mut loader = CatalogLoader::new(catalog());
        let mut cache = DependencyCache::new();
        let added = loader
            .load_all_versions_recursive(&mut cache, ["app"])
            .unwrap();
        assert_eq!(added, 5);
        assert!(cache.has_package("extra"));
        assert!(!cache.has_package("unrelated"));
        assert_eq!(
            loader.load_all_versions_recursive(&mut cache, ["app"]).unwrap(),
            0
        );
    }

    #[test]
    fn test_sorted_records_are_memoized() {
        let counting = CountingCatalog {
            inner: catalog(),
            sorted_calls: Cell::new(0),
        };
        let mut loader = CatalogLoader::new(counting);
        let mut first = DependencyCache::new();
        let mut second = DependencyCache::new();
        loader.load_all_versions(&mut first, "lib").unwrap();
        loader.load_all_versions(&mut second, "lib").unwrap();
        assert_eq!(loader.catalog().sorted_calls.get(), 1);
        assert_eq!(second.get_package_versions("lib"), vec!["1.0.0", "2.0.0"]);
    }
}
