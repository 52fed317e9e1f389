#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package catalog access for versolve
//!
//! This crate defines the boundary to the package catalog (the source of
//! version and dependency records), the in-memory dependency cache the solver
//! queries, and the loader that moves records from one to the other.

mod cache;
mod loader;
mod models;

pub use cache::{DependencyCache, DependencyMap};
pub use loader::CatalogLoader;
pub use models::{DependencyRecord, DependencyReference, VersionRecord};

use std::collections::BTreeMap;
use std::sync::Arc;
use versolve_errors::{CatalogError, Error};
use versolve_types::Version;

/// Read-only query interface to a package catalog
pub trait Catalog {
    /// Every record of a package, oldest version first. Unknown packages
    /// yield an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be queried.
    fn get_sorted_version_records(&self, package: &str) -> Result<Vec<VersionRecord>, Error>;

    /// One record, if the catalog has it
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be queried.
    fn get_version(&self, package: &str, version: &str) -> Result<Option<VersionRecord>, Error>;
}

impl<T: Catalog + ?Sized> Catalog for &T {
    fn get_sorted_version_records(&self, package: &str) -> Result<Vec<VersionRecord>, Error> {
        (**self).get_sorted_version_records(package)
    }

    fn get_version(&self, package: &str, version: &str) -> Result<Option<VersionRecord>, Error> {
        (**self).get_version(package, version)
    }
}

impl<T: Catalog + ?Sized> Catalog for Arc<T> {
    fn get_sorted_version_records(&self, package: &str) -> Result<Vec<VersionRecord>, Error> {
        (**self).get_sorted_version_records(package)
    }

    fn get_version(&self, package: &str, version: &str) -> Result<Option<VersionRecord>, Error> {
        (**self).get_version(package, version)
    }
}

/// Catalog held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    packages: BTreeMap<String, Vec<(Version, VersionRecord)>>,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from records
    ///
    /// # Errors
    ///
    /// Returns an error if a record has an invalid version or is a duplicate.
    pub fn from_records(records: impl IntoIterator<Item = VersionRecord>) -> Result<Self, Error> {
        let mut catalog = Self::new();
        for record in records {
            catalog.add_record(record)?;
        }
        Ok(catalog)
    }

    /// Parse a JSON list of version records
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a record is invalid.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Self::from_records(VersionRecord::list_from_json(json)?)
    }

    /// Serialize every record as a JSON list
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        let records: Vec<&VersionRecord> = self
            .packages
            .values()
            .flat_map(|versions| versions.iter().map(|(_, record)| record))
            .collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }

    /// Add a record, keeping the package's versions sorted
    ///
    /// # Errors
    ///
    /// Returns an error if the version does not parse or is already present.
    pub fn add_record(&mut self, record: VersionRecord) -> Result<(), Error> {
        let version = Version::parse(&record.version)?;
        let versions = self.packages.entry(record.package_name.clone()).or_default();
        if versions.iter().any(|(_, r)| r.version == record.version) {
            return Err(CatalogError::DuplicateEntry {
                package: record.package_name,
                version: record.version,
            }
            .into());
        }
        let position = versions.partition_point(|(existing, _)| *existing <= version);
        versions.insert(position, (version, record));
        Ok(())
    }

    #[must_use]
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    #[must_use]
    pub fn version_count(&self) -> usize {
        self.packages.values().map(Vec::len).sum()
    }
}

impl Catalog for InMemoryCatalog {
    fn get_sorted_version_records(&self, package: &str) -> Result<Vec<VersionRecord>, Error> {
        Ok(self
            .packages
            .get(package)
            .map(|versions| versions.iter().map(|(_, r)| r.clone()).collect())
            .unwrap_or_default())
    }

    fn get_version(&self, package: &str, version: &str) -> Result<Option<VersionRecord>, Error> {
        Ok(self.packages.get(package).and_then(|versions| {
            versions
                .iter()
                .find(|(_, r)| r.version == version)
                .map(|(_, r)| r.clone())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_sorted_by_version() {
        let catalog = InMemoryCatalog::from_records([
            VersionRecord::new("foo", "1.0.10"),
            VersionRecord::new("foo", "1.0.0"),
            VersionRecord::new("foo", "1.0.0-rc.0"),
            VersionRecord::new("foo", "1.0.2"),
        ])
        .unwrap();
        let versions: Vec<String> = catalog
            .get_sorted_version_records("foo")
            .unwrap()
            .into_iter()
            .map(|r| r.version)
            .collect();
        assert_eq!(versions, vec!["1.0.0-rc.0", "1.0.0", "1.0.2", "1.0.10"]);
        assert!(catalog.get_sorted_version_records("bar").unwrap().is_empty());
        assert_eq!(catalog.version_count(), 4);
    }

    #[test]
    fn test_duplicate_and_invalid_records() {
        let mut catalog = InMemoryCatalog::new();
        catalog.add_record(VersionRecord::new("foo", "1.0.0")).unwrap();
        assert!(catalog.add_record(VersionRecord::new("foo", "1.0.0")).is_err());
        assert!(catalog.add_record(VersionRecord::new("foo", "1.0")).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let catalog = InMemoryCatalog::from_records([VersionRecord::new("foo", "1.0.0")
            .with_dependency("bar@=1.0.0")
            .unwrap()])
        .unwrap();
        let json = catalog.to_json().unwrap();
        let back = InMemoryCatalog::from_json(&json).unwrap();
        assert_eq!(
            back.get_version("foo", "1.0.0").unwrap(),
            catalog.get_version("foo", "1.0.0").unwrap()
        );
    }
}
