//! Version, constraint and package-name parsing error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum VersionError {
    #[error("{reason}: {name}")]
    InvalidPackageName { name: String, reason: String },

    #[error("{reason}")]
    InvalidVersion { input: String, reason: String },

    #[error("{reason}")]
    InvalidConstraint { input: String, reason: String },
}

impl VersionError {
    /// The offending input text
    #[must_use]
    pub fn input(&self) -> &str {
        match self {
            Self::InvalidPackageName { name, .. } => name,
            Self::InvalidVersion { input, .. } | Self::InvalidConstraint { input, .. } => input,
        }
    }
}

impl UserFacingError for VersionError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidPackageName { .. } => {
                Some("Package names use lowercase letters, digits, dashes, dots and colons.")
            }
            Self::InvalidVersion { .. } => {
                Some("Use versions like 1.2.3, 1.2.3-rc.1 or 1.2.3_2 (wrap number).")
            }
            Self::InvalidConstraint { .. } => {
                Some("Use `1.2.3`, `=1.2.3` or alternatives joined with `||`.")
            }
        }
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InvalidPackageName { .. } => "version.invalid_package_name",
            Self::InvalidVersion { .. } => "version.invalid_version",
            Self::InvalidConstraint { .. } => "version.invalid_constraint",
        };
        Some(code)
    }
}
