use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata attached to every emitted event.
///
/// The correlation id ties together the events of one resolve call; source
/// and phase say which crate emitted it and how far the call had got.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMeta {
    pub event_id: Uuid,
    /// Shared by the events of one resolve call
    pub correlation_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub level: EventLevel,
    pub source: EventSource,
    pub phase: SolvePhase,
}

impl EventMeta {
    #[must_use]
    pub fn new(level: EventLevel, source: EventSource, phase: SolvePhase) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            correlation_id: None,
            timestamp: Utc::now(),
            level,
            source,
            phase,
        }
    }

    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

/// Severity an event is logged at
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Debug,
    Info,
    Error,
}

/// Crate that emitted the event
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    Resolver,
    Catalog,
}

impl EventSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resolver => "versolve-resolver",
            Self::Catalog => "versolve-catalog",
        }
    }
}

/// Step of a resolve call
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SolvePhase {
    /// Request validation, result cache lookup, feature seeding
    Request,
    PreviousSolution,
    /// Solving against the previous-solution cache only
    FastPath,
    FullCatalog,
    /// Answer returned or failure reported
    Outcome,
}

impl SolvePhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::PreviousSolution => "previous_solution",
            Self::FastPath => "fast_path",
            Self::FullCatalog => "full_catalog",
            Self::Outcome => "outcome",
        }
    }
}

impl fmt::Display for SolvePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
