use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::{debug, warn};

use super::{all_finite, mean, std_dev, Degradation, Estimate};

/// Mean of the success-rate window, or `None` when it is empty.
pub fn sample_mean(rates: &[f64]) -> Option<f64> {
    mean(rates)
}

/// Student-t confidence interval for the true success rate.
///
/// Interval = mean ± t(level, n-1) × SE, both bounds clamped into [0, 1].
/// Fewer than `min_samples` observations (never fewer than 2) yields (0, 0).
/// Zero standard error collapses the interval onto the mean.
pub fn confidence_interval(rates: &[f64], level: f64, min_samples: usize) -> Estimate<(f64, f64)> {
    let needed = min_samples.max(2);
    if rates.len() < needed {
        debug!("Confidence interval skipped: {} of {} samples", rates.len(), needed);
        return Estimate::degraded(
            (0.0, 0.0),
            Degradation::InsufficientData { needed, got: rates.len() },
        );
    }

    match try_interval(rates, level) {
        Ok(interval) => Estimate::Computed(interval),
        Err(reason) => {
            warn!("Confidence interval failed over {} samples: {}", rates.len(), reason);
            Estimate::degraded((0.0, 0.0), reason)
        }
    }
}

fn try_interval(rates: &[f64], level: f64) -> Result<(f64, f64), Degradation> {
    if !(level > 0.0 && level < 1.0) {
        return Err(Degradation::InvalidInput(format!("confidence level {} outside (0, 1)", level)));
    }
    if !all_finite(rates) {
        return Err(Degradation::InvalidInput("non-finite success rate".to_string()));
    }
    if let Some(bad) = rates.iter().find(|r| !(0.0..=1.0).contains(*r)) {
        return Err(Degradation::InvalidInput(format!("success rate {} outside [0, 1]", bad)));
    }

    let n = rates.len();
    let mean = mean(rates).ok_or_else(|| Degradation::Numerical("empty sample".to_string()))?;
    let sd = std_dev(rates, mean, 1).ok_or_else(|| Degradation::Numerical("undefined deviation".to_string()))?;
    let std_error = sd / (n as f64).sqrt();

    if std_error == 0.0 {
        let m = mean.clamp(0.0, 1.0);
        return Ok((m, m));
    }

    let dist = StudentsT::new(0.0, 1.0, (n - 1) as f64)
        .map_err(|e| Degradation::Numerical(format!("student-t: {}", e)))?;
    let critical = dist.inverse_cdf(1.0 - (1.0 - level) / 2.0);
    if !critical.is_finite() {
        return Err(Degradation::Numerical(format!("critical value {} at level {}", critical, level)));
    }

    let half_width = critical * std_error;
    let lower = (mean - half_width).clamp(0.0, 1.0);
    let upper = (mean + half_width).clamp(0.0, 1.0);
    Ok((lower, upper))
}
