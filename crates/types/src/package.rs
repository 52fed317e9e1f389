//! Package-related type definitions

use crate::constraint::PackageConstraint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use versolve_errors::VersionError;

fn bad_name(name: &str, reason: &str) -> VersionError {
    VersionError::InvalidPackageName {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

/// Check a package name against the naming rules
///
/// # Errors
///
/// Returns `VersionError::InvalidPackageName` with the first rule the name breaks.
pub fn validate_package_name(name: &str) -> Result<(), VersionError> {
    if let Some(bad) = name
        .chars()
        .find(|c| !matches!(c, 'a'..='z' | '0'..='9' | ':' | '.' | '-'))
    {
        return Err(bad_name(
            name,
            &format!(
                "Package names can only contain lowercase ASCII alphanumerics, dash, or dot (found {bad:?})"
            ),
        ));
    }
    if !name.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(bad_name(
            name,
            "Package name must contain a lowercase ASCII letter",
        ));
    }
    if name.starts_with('.') {
        return Err(bad_name(name, "Package name may not begin with a dot"));
    }
    if name.ends_with('.') {
        return Err(bad_name(name, "Package name may not end with a dot"));
    }
    if name.contains("..") {
        return Err(bad_name(
            name,
            "Package name may not contain two consecutive dots",
        ));
    }
    if name.starts_with('-') {
        return Err(bad_name(name, "Package name may not begin with a hyphen"));
    }
    if name.starts_with(':') || name.ends_with(':') {
        return Err(bad_name(
            name,
            "Package name may not start or end with a colon",
        ));
    }
    Ok(())
}

/// Identity of one resolved unit: a package at a specific version
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageAndVersion {
    pub package: String,
    pub version: String,
}

impl PackageAndVersion {
    #[must_use]
    pub fn new(package: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for PackageAndVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.package, self.version)
    }
}

impl FromStr for PackageAndVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(' ');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(package), Some(version), None) if !package.is_empty() && !version.is_empty() => {
                Ok(Self::new(package, version))
            }
            _ => Err(VersionError::InvalidVersion {
                input: s.to_string(),
                reason: format!("Malformed PackageAndVersion: {s}"),
            }),
        }
    }
}

impl Serialize for PackageAndVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PackageAndVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One edge of the dependency graph.
///
/// A weak dependency constrains the target's version when the target is
/// included for some other reason, but never pulls it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub constraint: PackageConstraint,
    pub weak: bool,
}

impl Dependency {
    #[must_use]
    pub fn new(constraint: PackageConstraint, weak: bool) -> Self {
        Self { constraint, weak }
    }

    #[must_use]
    pub fn strong(constraint: PackageConstraint) -> Self {
        Self::new(constraint, false)
    }

    #[must_use]
    pub fn weak(constraint: PackageConstraint) -> Self {
        Self::new(constraint, true)
    }

    /// Name of the package this edge points at
    #[must_use]
    pub fn package(&self) -> &str {
        self.constraint.package()
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.weak {
            f.write_str("?")?;
        }
        write!(f, "{}", self.constraint)
    }
}

impl FromStr for Dependency {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix('?') {
            Some("") => Err(VersionError::InvalidConstraint {
                input: s.to_string(),
                reason: "Weak dependency must name a package".to_string(),
            }),
            Some(rest) => Ok(Self::weak(rest.parse()?)),
            None => Ok(Self::strong(s.parse()?)),
        }
    }
}

impl Serialize for Dependency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Dependency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(name: &str) -> String {
        match validate_package_name(name).unwrap_err() {
            VersionError::InvalidPackageName { reason, .. } => reason,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_valid_names() {
        for name in ["foo", "x-", "x--y", "x--", "mdg:foo", "a.b", "foo2", "1a"] {
            assert!(validate_package_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_name_rules() {
        assert!(reason("Foo").starts_with("Package names can only contain"));
        assert!(reason("foo bar").starts_with("Package names can only contain"));
        assert!(reason("foo_bar").starts_with("Package names can only contain"));
        assert_eq!(reason("123"), "Package name must contain a lowercase ASCII letter");
        assert_eq!(reason(""), "Package name must contain a lowercase ASCII letter");
        assert_eq!(reason(".foo"), "Package name may not begin with a dot");
        assert_eq!(reason("foo."), "Package name may not end with a dot");
        assert_eq!(reason("foo..bar"), "Package name may not contain two consecutive dots");
        assert_eq!(reason("-foo"), "Package name may not begin with a hyphen");
        assert_eq!(reason(":foo"), "Package name may not start or end with a colon");
        assert_eq!(reason("foo:"), "Package name may not start or end with a colon");
    }

    #[test]
    fn test_package_and_version() {
        let pv: PackageAndVersion = "foo 1.0.0".parse().unwrap();
        assert_eq!(pv, PackageAndVersion::new("foo", "1.0.0"));
        assert_eq!(pv.to_string(), "foo 1.0.0");

        for bad in ["foo", "foo 1.0.0 extra", " 1.0.0", "foo "] {
            let err = bad.parse::<PackageAndVersion>().unwrap_err();
            assert!(err.to_string().starts_with("Malformed PackageAndVersion"));
        }
    }

    #[test]
    fn test_dependency_strings() {
        let weak: Dependency = "?weakly1@1.0.0".parse().unwrap();
        assert!(weak.weak);
        assert_eq!(weak.package(), "weakly1");
        assert_eq!(weak.to_string(), "?weakly1@1.0.0");

        let strong: Dependency = "bar@=2.0.0 || =2.0.1".parse().unwrap();
        assert!(!strong.weak);
        assert_eq!(strong.to_string(), "bar@=2.0.0 || =2.0.1");

        let bare: Dependency = "?weakly2".parse().unwrap();
        assert_eq!(bare.to_string(), "?weakly2");

        assert!("?".parse::<Dependency>().is_err());
        assert!("??foo".parse::<Dependency>().is_err());
    }
}
