//! Structured logging for events
//!
//! Converts domain events into tracing records with structured fields.

use crate::{AppEvent, CatalogEvent, EventMessage, ResolverEvent};
use tracing::{debug, error, info};

/// Log an event through `tracing` with structured fields
pub fn log_event(message: &EventMessage) {
    let meta = &message.meta;
    match &message.event {
        AppEvent::Resolver(event) => match event {
            ResolverEvent::ResolutionStarted {
                dependencies,
                constraints,
                has_previous_solution,
                upgrade,
            } => {
                info!(
                    target: "versolve::events::resolver",
                    source = meta.source.as_str(),
                    phase = meta.phase.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    dependencies = dependencies,
                    constraints = constraints,
                    has_previous_solution = has_previous_solution,
                    upgrade = ?upgrade,
                    "Resolution started"
                );
            }
            ResolverEvent::ResultCacheHit { total_packages } => {
                info!(
                    target: "versolve::events::resolver",
                    source = meta.source.as_str(),
                    phase = meta.phase.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    total_packages = total_packages,
                    "Reusing cached resolution"
                );
            }
            ResolverEvent::FastPathAttempted { previous_packages } => {
                info!(
                    target: "versolve::events::resolver",
                    source = meta.source.as_str(),
                    phase = meta.phase.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    previous_packages = previous_packages,
                    "Trying previous solution"
                );
            }
            ResolverEvent::FastPathInconclusive { reason } => {
                debug!(
                    target: "versolve::events::resolver",
                    source = meta.source.as_str(),
                    phase = meta.phase.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    reason = %reason,
                    "Previous solution insufficient, loading full catalog"
                );
            }
            ResolverEvent::ResolutionCompleted {
                total_packages,
                duration_ms,
                used_fast_path,
                packages_resolved,
            } => {
                info!(
                    target: "versolve::events::resolver",
                    source = meta.source.as_str(),
                    phase = meta.phase.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    total_packages = total_packages,
                    duration_ms = duration_ms,
                    used_fast_path = used_fast_path,
                    packages = ?packages_resolved,
                    "Resolution completed"
                );
            }
            ResolverEvent::DependencyConflictDetected {
                conflicting_packages,
                message: conflict,
            } => {
                error!(
                    target: "versolve::events::resolver",
                    source = meta.source.as_str(),
                    phase = meta.phase.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    packages = ?conflicting_packages,
                    conflict = %conflict,
                    "Dependency conflict detected"
                );
            }
            ResolverEvent::ResolutionFailed { failure } => {
                error!(
                    target: "versolve::events::resolver",
                    source = meta.source.as_str(),
                    phase = meta.phase.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Resolution failed"
                );
            }
        },
        AppEvent::Catalog(event) => match event {
            CatalogEvent::FeaturePackagesSeeded { added } => {
                debug!(
                    target: "versolve::events::catalog",
                    source = meta.source.as_str(),
                    phase = meta.phase.as_str(),
                    event_id = %meta.event_id,
                    added = added,
                    "Feature packages seeded"
                );
            }
            CatalogEvent::PreviousSolutionLoaded { requested, added } => {
                debug!(
                    target: "versolve::events::catalog",
                    source = meta.source.as_str(),
                    phase = meta.phase.as_str(),
                    event_id = %meta.event_id,
                    requested = requested,
                    added = added,
                    "Previous solution loaded"
                );
            }
            CatalogEvent::CatalogLoaded {
                versions_added,
                total_versions,
            } => {
                debug!(
                    target: "versolve::events::catalog",
                    source = meta.source.as_str(),
                    phase = meta.phase.as_str(),
                    event_id = %meta.event_id,
                    versions_added = versions_added,
                    total_versions = total_versions,
                    "Catalog loaded"
                );
            }
        },
    }
}
