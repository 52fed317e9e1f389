use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Resolver domain events for dependency resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResolverEvent {
    /// A resolve call started
    ResolutionStarted {
        dependencies: usize,
        constraints: usize,
        has_previous_solution: bool,
        upgrade: Vec<String>,
    },

    /// The request equals the previous one; the cached answer is reused
    ResultCacheHit { total_packages: usize },

    /// Solving against only the previous solution's versions
    FastPathAttempted { previous_packages: usize },

    /// The minimal catalog was not enough; falling back to the full catalog
    FastPathInconclusive { reason: String },

    /// Resolution completed successfully
    ResolutionCompleted {
        total_packages: usize,
        duration_ms: u64,
        used_fast_path: bool,
        packages_resolved: Vec<String>,
    },

    /// No assignment satisfies the constraints
    DependencyConflictDetected {
        conflicting_packages: Vec<String>,
        message: String,
    },

    /// Resolution failed for any other reason
    ResolutionFailed { failure: FailureContext },
}

impl ResolverEvent {
    /// Create a conflict detected event with basic info
    #[must_use]
    pub fn conflict_detected(packages: Vec<String>, message: String) -> Self {
        Self::DependencyConflictDetected {
            conflicting_packages: packages,
            message,
        }
    }
}
