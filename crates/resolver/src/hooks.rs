//! Progress and profiling hooks. Neither affects resolution results.

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Called periodically during long searches
pub type Nudge = Arc<dyn Fn() + Send + Sync>;

/// Receives the duration of named resolution phases
pub trait Profile: Send + Sync {
    fn record(&self, label: &str, elapsed: Duration);
}

pub(crate) fn timed<T>(profile: Option<&dyn Profile>, label: &str, f: impl FnOnce() -> T) -> T {
    let Some(profile) = profile else {
        return f();
    };
    let start = Instant::now();
    let result = f();
    profile.record(label, start.elapsed());
    result
}
