//! Version and package constraints
//!
//! A version constraint is a `||`-separated list of alternatives:
//! - `` (empty) - any reasonable version, meaning no unexpected prerelease
//! - `1.2.3` - compatible with 1.2.3 (same major, or same minor under 0.x)
//! - `=1.2.3` - exactly 1.2.3, build metadata ignored
//!
//! Package constraints attach one to a name: `foo`, `foo@1.2.3`, `foo@=1.0.0 || 2.0.0`.

use crate::package::validate_package_name;
use crate::version::Version;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use versolve_errors::VersionError;

/// One alternative of a version constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleConstraint {
    AnyReasonable,
    CompatibleWith(Version),
    Exactly(Version),
}

impl SimpleConstraint {
    /// Check a version against this alternative. `anticipated` lists the
    /// prerelease versions of the package that count as reasonable.
    #[must_use]
    pub fn is_satisfied_by(&self, version: &Version, anticipated: Option<&BTreeSet<String>>) -> bool {
        match self {
            Self::AnyReasonable => {
                !version.has_prerelease()
                    || anticipated.is_some_and(|set| set.contains(version.version()))
            }
            Self::CompatibleWith(base) => version.is_compatible_with(base),
            Self::Exactly(exact) => version.version() == exact.version(),
        }
    }

    #[must_use]
    pub fn version(&self) -> Option<&Version> {
        match self {
            Self::AnyReasonable => None,
            Self::CompatibleWith(v) | Self::Exactly(v) => Some(v),
        }
    }
}

impl fmt::Display for SimpleConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyReasonable => Ok(()),
            Self::CompatibleWith(v) => write!(f, "{v}"),
            Self::Exactly(v) => write!(f, "={v}"),
        }
    }
}

/// A disjunction of [`SimpleConstraint`]s, in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    raw: String,
    alternatives: Vec<SimpleConstraint>,
}

fn invalid_constraint(input: &str, reason: impl Into<String>) -> VersionError {
    VersionError::InvalidConstraint {
        input: input.to_string(),
        reason: reason.into(),
    }
}

impl VersionConstraint {
    /// The constraint that accepts any reasonable version
    #[must_use]
    pub fn any() -> Self {
        Self {
            raw: String::new(),
            alternatives: vec![SimpleConstraint::AnyReasonable],
        }
    }

    /// Parse a constraint string. The empty string means "any".
    ///
    /// # Errors
    ///
    /// Returns `VersionError::InvalidConstraint` for empty alternatives, stray
    /// whitespace, single `|` separators or unparseable versions.
    pub fn parse(raw: &str) -> Result<Self, VersionError> {
        if raw.is_empty() {
            return Ok(Self::any());
        }

        let parts: Vec<&str> = raw.split("||").collect();
        let last = parts.len() - 1;
        let mut alternatives = Vec::with_capacity(parts.len());
        for (i, part) in parts.into_iter().enumerate() {
            // Only spaces hugging a `||` are separators; anything else is
            // left for the version parser to reject.
            let mut text = part;
            if i > 0 {
                text = text.trim_start_matches(' ');
            }
            if i < last {
                text = text.trim_end_matches(' ');
            }
            if text.is_empty() {
                return Err(invalid_constraint(
                    raw,
                    format!("Invalid constraint string: {raw}"),
                ));
            }

            let (exact, version_text) = match text.strip_prefix('=') {
                Some(rest) => (true, rest),
                None => (false, text),
            };
            let version = Version::parse(version_text).map_err(|err| match err {
                VersionError::InvalidVersion { reason, .. } => invalid_constraint(raw, reason),
                other => other,
            })?;
            alternatives.push(if exact {
                SimpleConstraint::Exactly(version)
            } else {
                SimpleConstraint::CompatibleWith(version)
            });
        }

        Ok(Self {
            raw: raw.to_string(),
            alternatives,
        })
    }

    /// The constraint string as written
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn alternatives(&self) -> &[SimpleConstraint] {
        &self.alternatives
    }

    /// True for the unqualified "any reasonable version" constraint
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.raw.is_empty()
    }

    #[must_use]
    pub fn is_satisfied_by(&self, version: &Version, anticipated: Option<&BTreeSet<String>>) -> bool {
        self.alternatives
            .iter()
            .any(|alt| alt.is_satisfied_by(version, anticipated))
    }

    /// Versions named by `=` alternatives
    pub fn exact_versions(&self) -> impl Iterator<Item = &Version> {
        self.alternatives.iter().filter_map(|alt| match alt {
            SimpleConstraint::Exactly(v) => Some(v),
            _ => None,
        })
    }

    /// Combine two constraints with `||`, keeping source order
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let raw = if self.raw == other.raw {
            self.raw.clone()
        } else {
            format!("{} || {}", self.raw, other.raw)
        };
        let mut alternatives = self.alternatives.clone();
        for alt in &other.alternatives {
            if !alternatives.contains(alt) {
                alternatives.push(alt.clone());
            }
        }
        Self { raw, alternatives }
    }
}

impl Default for VersionConstraint {
    fn default() -> Self {
        Self::any()
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for VersionConstraint {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A package name with a version constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageConstraint {
    package: String,
    constraint: VersionConstraint,
}

impl PackageConstraint {
    /// Build from a name and an optional constraint string
    ///
    /// # Errors
    ///
    /// Returns `VersionError` if the name or the constraint is invalid.
    pub fn new(package: &str, constraint: Option<&str>) -> Result<Self, VersionError> {
        validate_package_name(package)?;
        Ok(Self {
            package: package.to_string(),
            constraint: VersionConstraint::parse(constraint.unwrap_or_default())?,
        })
    }

    /// Parse `name` or `name@constraint`
    ///
    /// # Errors
    ///
    /// Returns `VersionError` for repeated `@`, an empty constraint after `@`,
    /// an invalid name or an invalid constraint.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let mut parts = s.splitn(3, '@');
        let package = parts.next().unwrap_or_default();
        let constraint = parts.next();
        if parts.next().is_some() {
            return Err(invalid_constraint(
                s,
                format!("Too many @s in package constraint: {s}"),
            ));
        }
        if constraint == Some("") {
            return Err(invalid_constraint(
                s,
                format!(
                    "Version constraint for package '{package}' cannot be empty; leave off the @ if you don't want to constrain the version."
                ),
            ));
        }
        Self::new(package, constraint)
    }

    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    #[must_use]
    pub fn constraint(&self) -> &VersionConstraint {
        &self.constraint
    }

    /// The constraint string as written, empty when unconstrained
    #[must_use]
    pub fn constraint_string(&self) -> &str {
        self.constraint.raw()
    }

    #[must_use]
    pub fn is_satisfied_by(&self, version: &Version, anticipated: Option<&BTreeSet<String>>) -> bool {
        self.constraint.is_satisfied_by(version, anticipated)
    }
}

impl fmt::Display for PackageConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.constraint.is_any() {
            f.write_str(&self.package)
        } else {
            write!(f, "{}@{}", self.package, self.constraint)
        }
    }
}

impl FromStr for PackageConstraint {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PackageConstraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PackageConstraint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Whether a constraint string uses syntax older consumers cannot read
/// (wrap numbers or `||` alternatives).
#[must_use]
pub fn invalid_first_format_constraint(constraint: &str) -> bool {
    constraint.contains('_') || constraint.contains('|')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn pc(s: &str) -> PackageConstraint {
        PackageConstraint::parse(s).unwrap()
    }

    #[test]
    fn test_parse_alternatives() {
        let c = VersionConstraint::parse("=1.0.0 || 2.0.0").unwrap();
        assert_eq!(
            c.alternatives(),
            &[
                SimpleConstraint::Exactly(v("1.0.0")),
                SimpleConstraint::CompatibleWith(v("2.0.0"))
            ]
        );
        assert_eq!(c.raw(), "=1.0.0 || 2.0.0");

        let tight = VersionConstraint::parse("1.0.0||2.0.0").unwrap();
        assert_eq!(tight.alternatives().len(), 2);

        let any = VersionConstraint::parse("").unwrap();
        assert!(any.is_any());
        assert_eq!(any.alternatives(), &[SimpleConstraint::AnyReasonable]);
    }

    #[test]
    fn test_package_constraint_parse() {
        let c = pc("foo@1.2.3");
        assert_eq!(c.package(), "foo");
        assert_eq!(c.constraint_string(), "1.2.3");
        assert_eq!(c.to_string(), "foo@1.2.3");

        let bare = pc("foo");
        assert_eq!(bare.constraint_string(), "");
        assert_eq!(bare.to_string(), "foo");

        let exact = pc("foo@=1.2.3_1+build");
        assert_eq!(exact.constraint_string(), "=1.2.3_1+build");
        assert!(exact.is_satisfied_by(&v("1.2.3_1"), None));

        let two_arg = PackageConstraint::new("foo", Some("=1.0.0")).unwrap();
        assert_eq!(two_arg, pc("foo@=1.0.0"));
        assert_eq!(PackageConstraint::new("foo", None).unwrap(), bare);
    }

    #[test]
    fn test_package_constraint_failures() {
        for bad in [
            "foo@1.0.0 ",
            "foo@1.0.0 | 1.0.0",
            "foo@1.0.0 ||",
            "foo@|| 1.0.0",
            "foo@1.0.0 || || 2.0.0",
            "foo || bar",
            "foo@>=1.0.0",
            "foo@1.2.3+1234_1",
            "foo@1.2.3_1-rc1",
            "foo@1.0",
            "Foo@1.0.0",
        ] {
            assert!(PackageConstraint::parse(bad).is_err(), "{bad} should fail");
        }

        let err = PackageConstraint::parse("foo@").unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
        let err = PackageConstraint::parse("foo@1@2").unwrap_err();
        assert!(err.to_string().starts_with("Too many @s"));
        let err = PackageConstraint::parse("foo@1.0.0 ||").unwrap_err();
        assert!(err.to_string().starts_with("Invalid constraint string"));
    }

    #[test]
    fn test_any_reasonable() {
        let any = VersionConstraint::any();
        assert!(any.is_satisfied_by(&v("1.0.0"), None));
        assert!(!any.is_satisfied_by(&v("1.0.0-rc.1"), None));

        let anticipated: BTreeSet<String> = ["1.0.0-rc.1".to_string()].into();
        assert!(any.is_satisfied_by(&v("1.0.0-rc.1"), Some(&anticipated)));
        assert!(!any.is_satisfied_by(&v("1.0.0-rc.2"), Some(&anticipated)));
    }

    #[test]
    fn test_compatible_and_exact() {
        let c = VersionConstraint::parse("1.2.0").unwrap();
        assert!(c.is_satisfied_by(&v("1.2.0"), None));
        assert!(c.is_satisfied_by(&v("1.9.0"), None));
        assert!(!c.is_satisfied_by(&v("1.1.9"), None));
        assert!(!c.is_satisfied_by(&v("2.0.0"), None));

        let zero = VersionConstraint::parse("0.2.0").unwrap();
        assert!(zero.is_satisfied_by(&v("0.2.7"), None));
        assert!(!zero.is_satisfied_by(&v("0.3.0"), None));

        let exact = VersionConstraint::parse("=1.0.0").unwrap();
        assert!(exact.is_satisfied_by(&v("1.0.0+other"), None));
        assert!(!exact.is_satisfied_by(&v("1.0.1"), None));
        assert!(!exact.is_satisfied_by(&v("1.0.0_1"), None));

        let either = VersionConstraint::parse("=1.0.0 || 2.0.0").unwrap();
        assert!(either.is_satisfied_by(&v("1.0.0"), None));
        assert!(either.is_satisfied_by(&v("2.3.0"), None));
        assert!(!either.is_satisfied_by(&v("1.5.0"), None));
        assert_eq!(either.exact_versions().count(), 1);
    }

    #[test]
    fn test_union() {
        let a = VersionConstraint::parse("=1.0.0").unwrap();
        let b = VersionConstraint::parse("2.0.0").unwrap();
        let both = a.union(&b);
        assert_eq!(both.raw(), "=1.0.0 || 2.0.0");
        assert_eq!(both, VersionConstraint::parse("=1.0.0 || 2.0.0").unwrap());
        assert_eq!(a.union(&a).alternatives().len(), 1);
    }

    #[test]
    fn test_invalid_first_format() {
        assert!(!invalid_first_format_constraint("1.0.0"));
        assert!(invalid_first_format_constraint("1.0.0_1"));
        assert!(invalid_first_format_constraint("1.0.0 || 2.0.0"));
    }

    #[test]
    fn test_serde_as_string() {
        let c = pc("foo@=1.0.0 || 2.0.0");
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "\"foo@=1.0.0 || 2.0.0\"");
        assert_eq!(serde_json::from_str::<PackageConstraint>(&json).unwrap(), c);
    }
}
