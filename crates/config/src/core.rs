//! Configuration sections

use serde::{Deserialize, Serialize};

/// Resolver behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverSection {
    /// Reuse the previous answer when an identical request arrives
    #[serde(default = "default_result_cache")]
    pub result_cache: bool,
    /// Fail instead of ignoring previous-solution versions missing from the catalog
    #[serde(default)]
    pub missing_previous_version_is_error: bool,
}

impl Default for ResolverSection {
    fn default() -> Self {
        Self {
            result_cache: default_result_cache(),
            missing_previous_version_is_error: false,
        }
    }
}

/// SAT search tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverSection {
    /// Decisions between calls to the nudge hook
    #[serde(default = "default_nudge_interval")]
    pub nudge_interval: u64,
    /// Upper bound on enumerated solutions when all answers are requested
    #[serde(default = "default_all_answers_limit")]
    pub all_answers_limit: usize,
}

impl Default for SolverSection {
    fn default() -> Self {
        Self {
            nudge_interval: default_nudge_interval(),
            all_answers_limit: default_all_answers_limit(),
        }
    }
}

/// Conflict report shaping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsSection {
    #[serde(default = "default_max_constraints_per_package")]
    pub max_constraints_per_package: usize,
}

impl Default for DiagnosticsSection {
    fn default() -> Self {
        Self {
            max_constraints_per_package: default_max_constraints_per_package(),
        }
    }
}

fn default_result_cache() -> bool {
    true
}

fn default_nudge_interval() -> u64 {
    1000
}

fn default_all_answers_limit() -> usize {
    1000
}

fn default_max_constraints_per_package() -> usize {
    10
}
