use serde::{Deserialize, Serialize};

/// Catalog loading events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CatalogEvent {
    /// Feature packages were added to the dependency cache as empty versions
    FeaturePackagesSeeded { added: usize },

    /// Only the versions named by the previous solution were loaded
    PreviousSolutionLoaded { requested: usize, added: usize },

    /// Every version reachable from the request was loaded
    CatalogLoaded {
        versions_added: usize,
        total_versions: usize,
    },
}
