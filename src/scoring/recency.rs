use chrono::{DateTime, Utc};
use tracing::debug;

use super::{Degradation, Estimate};

/// Exponential decay weight exp(-elapsed / tau), in (0, 1].
///
/// Negative elapsed time (clock skew between workers) is clamped to zero and
/// reported as `ClockSkew`. Non-finite elapsed or non-positive tau yields 0.
pub fn decay_weight(elapsed_hours: f64, tau_hours: f64) -> Estimate<f64> {
    if !(tau_hours > 0.0 && tau_hours.is_finite()) {
        return Estimate::degraded(0.0, Degradation::InvalidInput(format!("decay tau {}h", tau_hours)));
    }
    if elapsed_hours.is_nan() {
        return Estimate::degraded(0.0, Degradation::InvalidInput("elapsed time is NaN".to_string()));
    }
    if elapsed_hours < 0.0 {
        debug!("Clock skew: last success {:.3}h in the future", -elapsed_hours);
        return Estimate::degraded(1.0, Degradation::ClockSkew { hours: elapsed_hours });
    }
    // +inf elapsed decays to exactly 0
    Estimate::Computed((-elapsed_hours / tau_hours).exp())
}

/// Hours from `since` to `now`; negative when `since` is in the future.
pub fn hours_between(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - since).num_milliseconds() as f64 / 3_600_000.0
}
