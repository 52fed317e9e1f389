//! Catalog record models

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use versolve_errors::{CatalogError, Error, VersionError};
use versolve_types::{Dependency, PackageConstraint};

/// One published version of a package, as the catalog describes it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    pub package_name: String,
    pub version: String,
    #[serde(default)]
    pub dependencies: BTreeMap<String, DependencyRecord>,
}

/// A dependency as stored in the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<DependencyReference>,
}

/// Where a dependency applies (per architecture) and whether it is weak there
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReference {
    pub arch: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub weak: bool,
}

impl DependencyRecord {
    /// Weak only when every reference is weak
    #[must_use]
    pub fn is_weak(&self) -> bool {
        !self.references.is_empty() && self.references.iter().all(|r| r.weak)
    }
}

impl VersionRecord {
    #[must_use]
    pub fn new(package_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            version: version.into(),
            dependencies: BTreeMap::new(),
        }
    }

    /// Add a dependency given as `name` / `name@constraint` / `?name@constraint`
    ///
    /// # Errors
    ///
    /// Returns an error if the dependency string does not parse.
    pub fn with_dependency(mut self, dependency: &str) -> Result<Self, VersionError> {
        let parsed: Dependency = dependency.parse()?;
        let record = DependencyRecord {
            constraint: (!parsed.constraint.constraint_string().is_empty())
                .then(|| parsed.constraint.constraint_string().to_string()),
            references: vec![DependencyReference {
                arch: "os".to_string(),
                weak: parsed.weak,
            }],
        };
        self.dependencies
            .insert(parsed.package().to_string(), record);
        Ok(self)
    }

    /// Convert the record's dependencies into cache form
    ///
    /// # Errors
    ///
    /// Returns an error if a dependency name or constraint is invalid.
    pub fn to_dependencies(&self) -> Result<Vec<Dependency>, VersionError> {
        self.dependencies
            .iter()
            .map(|(name, record)| {
                let constraint = PackageConstraint::new(name, record.constraint.as_deref())?;
                Ok(Dependency::new(constraint, record.is_weak()))
            })
            .collect()
    }

    /// Parse a list of records from JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn list_from_json(json: &str) -> Result<Vec<Self>, Error> {
        serde_json::from_str(json).map_err(|e| {
            CatalogError::MalformedEntry {
                entry: "<version records>".to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_json_shape() {
        let json = r#"[{
            "packageName": "foo",
            "version": "1.0.0",
            "dependencies": {
                "bar": {"constraint": "=2.0.0", "references": [{"arch": "os"}]},
                "baz": {"references": [{"arch": "os", "weak": true}, {"arch": "web", "weak": true}]},
                "qux": {"constraint": "1.0.0", "references": [{"arch": "os", "weak": true}, {"arch": "web"}]},
                "zap": {}
            }
        }]"#;
        let records = VersionRecord::list_from_json(json).unwrap();
        let deps = records[0].to_dependencies().unwrap();
        let rendered: Vec<String> = deps.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["bar@=2.0.0", "?baz", "qux@1.0.0", "zap"]);
    }

    #[test]
    fn test_builder() {
        let record = VersionRecord::new("foo", "1.0.0")
            .with_dependency("?bar@1.0.0")
            .unwrap()
            .with_dependency("baz")
            .unwrap();
        let deps = record.to_dependencies().unwrap();
        assert!(deps[0].weak);
        assert_eq!(deps[1].to_string(), "baz");
        assert!(VersionRecord::new("foo", "1.0.0")
            .with_dependency("Bad")
            .is_err());
    }
}
