//! Catalog and dependency cache error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum CatalogError {
    #[error("Already have an entry for {package} {version}")]
    DuplicateEntry { package: String, version: String },

    #[error("No entry for {package} {version}")]
    UnknownVersion { package: String, version: String },

    #[error("malformed catalog entry {entry}: {message}")]
    MalformedEntry { entry: String, message: String },

    #[error("catalog unavailable: {message}")]
    Unavailable { message: String },
}

impl UserFacingError for CatalogError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Unavailable { .. } => Some("Check that the package catalog is reachable."),
            Self::MalformedEntry { .. } => {
                Some("Entries are keyed as \"<package> <version>\" with constraint strings.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::DuplicateEntry { .. } => "catalog.duplicate_entry",
            Self::UnknownVersion { .. } => "catalog.unknown_version",
            Self::MalformedEntry { .. } => "catalog.malformed_entry",
            Self::Unavailable { .. } => "catalog.unavailable",
        };
        Some(code)
    }
}
