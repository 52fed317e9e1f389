use serde::{Deserialize, Serialize};

use crate::{EventLevel, EventSource, SolvePhase};
use versolve_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod catalog;
pub mod resolver;

pub use catalog::CatalogEvent;
pub use resolver::ResolverEvent;

/// Top-level event enum aggregating the domain events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// Resolution lifecycle events
    Resolver(ResolverEvent),

    /// Dependency cache loading events
    Catalog(CatalogEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for metadata/logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::Resolver(_) => EventSource::Resolver,
            Self::Catalog(_) => EventSource::Catalog,
        }
    }

    /// Step of the resolve call the event belongs to
    #[must_use]
    pub fn phase(&self) -> SolvePhase {
        match self {
            Self::Resolver(
                ResolverEvent::ResolutionStarted { .. } | ResolverEvent::ResultCacheHit { .. },
            )
            | Self::Catalog(CatalogEvent::FeaturePackagesSeeded { .. }) => SolvePhase::Request,
            Self::Catalog(CatalogEvent::PreviousSolutionLoaded { .. }) => {
                SolvePhase::PreviousSolution
            }
            Self::Resolver(
                ResolverEvent::FastPathAttempted { .. } | ResolverEvent::FastPathInconclusive { .. },
            ) => SolvePhase::FastPath,
            Self::Catalog(CatalogEvent::CatalogLoaded { .. }) => SolvePhase::FullCatalog,
            Self::Resolver(
                ResolverEvent::ResolutionCompleted { .. }
                | ResolverEvent::DependencyConflictDetected { .. }
                | ResolverEvent::ResolutionFailed { .. },
            ) => SolvePhase::Outcome,
        }
    }

    /// Default severity for the event.
    #[must_use]
    pub fn log_level(&self) -> EventLevel {
        match self {
            Self::Resolver(
                ResolverEvent::ResolutionFailed { .. }
                | ResolverEvent::DependencyConflictDetected { .. },
            ) => EventLevel::Error,
            Self::Resolver(ResolverEvent::FastPathInconclusive { .. }) => EventLevel::Debug,
            Self::Resolver(_) => EventLevel::Info,
            Self::Catalog(_) => EventLevel::Debug,
        }
    }

    /// Tracing target used when the event is logged.
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::Resolver(_) => "versolve::events::resolver",
            Self::Catalog(_) => "versolve::events::catalog",
        }
    }
}
