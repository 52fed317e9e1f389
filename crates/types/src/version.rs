//! Version parsing and ordering
//!
//! Versions are "loose semver": `MAJOR.MINOR.PATCH[-PRERELEASE][_WRAP][+BUILD]`.
//! The semver core (everything but the wrap number) is validated strictly by
//! the `semver` crate. The wrap number marks a re-release of an identical
//! semver and sorts after the prerelease. Build metadata never affects ordering.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use versolve_errors::VersionError;

/// Alphabet used to turn prerelease identifiers into magnitudes
const VALID_CHARACTERS: &str = "-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// One dot-separated prerelease identifier.
///
/// Numeric identifiers keep their digits, so any length is accepted. They
/// sort before alphanumeric ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrereleasePart {
    Numeric(String),
    Alpha(String),
}

impl Ord for PrereleasePart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            // No leading zeros, so the longer number is the larger one
            (Self::Numeric(a), Self::Numeric(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Self::Numeric(_), Self::Alpha(_)) => Ordering::Less,
            (Self::Alpha(_), Self::Numeric(_)) => Ordering::Greater,
            (Self::Alpha(a), Self::Alpha(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for PrereleasePart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PrereleasePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(s) | Self::Alpha(s) => f.write_str(s),
        }
    }
}

/// A parsed package version
#[derive(Debug, Clone)]
pub struct Version {
    major: u64,
    minor: u64,
    patch: u64,
    prerelease: Vec<PrereleasePart>,
    wrap_num: u64,
    build: Vec<String>,
    raw: String,
}

fn invalid(input: &str, reason: impl Into<String>) -> VersionError {
    VersionError::InvalidVersion {
        input: input.to_string(),
        reason: reason.into(),
    }
}

fn not_semver(input: &str) -> VersionError {
    invalid(
        input,
        format!("Version string must look like semver (eg '1.2.3'), not '{input}'."),
    )
}

impl Version {
    /// Parse a version string
    ///
    /// # Errors
    ///
    /// Returns `VersionError::InvalidVersion` naming the violated rule when the
    /// string is not a valid version.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        if input.is_empty() {
            return Err(invalid(input, "Empty string is not a valid version"));
        }

        let mut plus = input.splitn(3, '+');
        let head = plus.next().unwrap_or_default();
        let build = plus.next();
        if plus.next().is_some() {
            return Err(invalid(input, format!("Can't have two + in version: {input}")));
        }

        let mut underscore = head.splitn(3, '_');
        let core = underscore.next().unwrap_or_default();
        let wrap = underscore.next();
        if underscore.next().is_some() {
            return Err(invalid(input, format!("Can't have two _ in version: {input}")));
        }

        let wrap_num = match wrap {
            None => 0,
            Some("") => return Err(invalid(input, "A wrap number must follow _")),
            Some(w) if !w.bytes().all(|b| b.is_ascii_digit()) => {
                return Err(invalid(
                    input,
                    format!(
                        "The wrap number (after _) must contain only digits, so {input} is invalid."
                    ),
                ))
            }
            Some(w) if w.starts_with('0') => {
                return Err(invalid(
                    input,
                    format!(
                        "The wrap number (after _) must not have a leading zero, so {input} is invalid."
                    ),
                ))
            }
            Some(w) => w.parse().map_err(|_| not_semver(input))?,
        };

        let semver_text = match build {
            Some(build) => format!("{core}+{build}"),
            None => core.to_string(),
        };
        let parsed = semver::Version::parse(&semver_text).map_err(|_| not_semver(input))?;

        let prerelease = if parsed.pre.is_empty() {
            Vec::new()
        } else {
            parsed
                .pre
                .as_str()
                .split('.')
                .map(|part| {
                    if part.bytes().all(|b| b.is_ascii_digit()) {
                        PrereleasePart::Numeric(part.to_string())
                    } else {
                        PrereleasePart::Alpha(part.to_string())
                    }
                })
                .collect()
        };

        let build = if parsed.build.is_empty() {
            Vec::new()
        } else {
            parsed.build.as_str().split('.').map(String::from).collect()
        };

        Ok(Self {
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
            prerelease,
            wrap_num,
            build,
            raw: input.to_string(),
        })
    }

    #[must_use]
    pub fn major(&self) -> u64 {
        self.major
    }

    #[must_use]
    pub fn minor(&self) -> u64 {
        self.minor
    }

    #[must_use]
    pub fn patch(&self) -> u64 {
        self.patch
    }

    #[must_use]
    pub fn prerelease(&self) -> &[PrereleasePart] {
        &self.prerelease
    }

    #[must_use]
    pub fn has_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }

    #[must_use]
    pub fn wrap_num(&self) -> u64 {
        self.wrap_num
    }

    #[must_use]
    pub fn build(&self) -> &[String] {
        &self.build
    }

    /// The string this version was parsed from
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The raw string without build metadata
    #[must_use]
    pub fn version(&self) -> &str {
        self.raw
            .split_once('+')
            .map_or(self.raw.as_str(), |(version, _)| version)
    }

    /// The raw string without the wrap number
    #[must_use]
    pub fn semver(&self) -> String {
        match self.raw.split_once('+') {
            Some((head, build)) => {
                let core = head.split_once('_').map_or(head, |(core, _)| core);
                format!("{core}+{build}")
            }
            None => self
                .raw
                .split_once('_')
                .map_or(self.raw.as_str(), |(core, _)| core)
                .to_string(),
        }
    }

    /// Whether this version can stand in for `base` under a compatible-with
    /// constraint: at least as new, with the same leading significant component.
    #[must_use]
    pub fn is_compatible_with(&self, base: &Version) -> bool {
        if self < base {
            return false;
        }
        if base.major > 0 {
            self.major == base.major
        } else {
            self.major == 0 && self.minor == base.minor
        }
    }

    /// Single number approximating the version order.
    ///
    /// Only the first two characters of a string prerelease identifier are
    /// weighed, so `1.0.0-beta.0` and `1.0.0-bear.0` have equal magnitude.
    /// Use [`Ord`] for exact comparisons.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn magnitude(&self) -> f64 {
        let fraction = if self.prerelease.is_empty() {
            0.0
        } else {
            let mut scale = 1.0;
            self.prerelease.iter().fold(-1.0, |memo, part| {
                scale /= 10000.0;
                memo + prerelease_digit(part) * scale
            })
        };

        self.major as f64 * 10000.0
            + self.minor as f64 * 100.0
            + self.patch as f64
            + self.wrap_num as f64 / 100.0
            + fraction / 100.0
    }
}

#[allow(clippy::cast_precision_loss)]
fn prerelease_digit(part: &PrereleasePart) -> f64 {
    match part {
        PrereleasePart::Numeric(digits) => digits.parse::<f64>().unwrap_or(0.0) + 1.0,
        PrereleasePart::Alpha(s) => {
            let index = |c: char| VALID_CHARACTERS.find(c).unwrap_or(0) as f64;
            let mut chars = s.chars();
            let first = chars.next().map_or(0.0, index);
            let second = chars.next().map_or(0.0, index);
            101.0 + first * 63.0 + second
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| {
                match (self.prerelease.is_empty(), other.prerelease.is_empty()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => self.prerelease.cmp(&other.prerelease),
                }
            })
            .then_with(|| self.wrap_num.cmp(&other.wrap_num))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.major.hash(state);
        self.minor.hash(state);
        self.patch.hash(state);
        self.prerelease.hash(state);
        self.wrap_num.hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Compare two version strings
///
/// # Errors
///
/// Returns an error if either string is not a valid version.
pub fn compare(a: &str, b: &str) -> Result<Ordering, VersionError> {
    Ok(Version::parse(a)?.cmp(&Version::parse(b)?))
}

/// Whether version `a` sorts strictly before version `b`
///
/// # Errors
///
/// Returns an error if either string is not a valid version.
pub fn less_than(a: &str, b: &str) -> Result<bool, VersionError> {
    Ok(compare(a, b)? == Ordering::Less)
}

/// See [`Version::magnitude`]
///
/// # Errors
///
/// Returns an error if the string is not a valid version.
pub fn version_magnitude(version: &str) -> Result<f64, VersionError> {
    Ok(Version::parse(version)?.magnitude())
}
