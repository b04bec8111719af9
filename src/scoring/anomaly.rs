use tracing::warn;

use super::{all_finite, mean, std_dev, Degradation, Estimate};

/// Flag response times whose population z-score exceeds `threshold`.
///
/// One flag per sample, in input order. Fewer than two samples, a constant
/// sequence, or any invalid input yields all-false.
pub fn detect_anomalies(response_times: &[f64], threshold: f64) -> Estimate<Vec<bool>> {
    let n = response_times.len();
    let clean = || vec![false; n];

    if n < 2 {
        return Estimate::degraded(clean(), Degradation::InsufficientData { needed: 2, got: n });
    }
    if !(threshold > 0.0 && threshold.is_finite()) {
        warn!("Anomaly detection skipped: invalid z threshold {}", threshold);
        return Estimate::degraded(clean(), Degradation::InvalidInput(format!("z threshold {}", threshold)));
    }
    if !all_finite(response_times) {
        warn!("Anomaly detection skipped: non-finite response time in {} samples", n);
        return Estimate::degraded(clean(), Degradation::InvalidInput("non-finite response time".to_string()));
    }

    let Some(avg) = mean(response_times) else {
        return Estimate::degraded(clean(), Degradation::Numerical("undefined mean".to_string()));
    };
    let Some(sd) = std_dev(response_times, avg, 0) else {
        return Estimate::degraded(clean(), Degradation::Numerical("undefined deviation".to_string()));
    };

    if sd == 0.0 {
        return Estimate::degraded(clean(), Degradation::ZeroVariance { samples: n });
    }
    if !sd.is_finite() {
        warn!("Anomaly detection failed: deviation {} over {} samples", sd, n);
        return Estimate::degraded(clean(), Degradation::Numerical(format!("deviation {}", sd)));
    }

    let flags = response_times
        .iter()
        .map(|v| ((v - avg) / sd).abs() > threshold)
        .collect();
    Estimate::Computed(flags)
}

/// Fraction of flagged samples; 0 for an empty slice.
pub fn anomaly_ratio(flags: &[bool]) -> f64 {
    if flags.is_empty() {
        return 0.0;
    }
    flags.iter().filter(|f| **f).count() as f64 / flags.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_far_outlier() {
        let times = [0.5, 0.6, 0.55, 2.1, 0.58, 0.52];
        let flags = detect_anomalies(&times, 2.0);
        assert!(!flags.is_degraded());
        assert_eq!(flags.into_value(), vec![false, false, false, true, false, false]);
    }

    #[test]
    fn test_constant_sequence_never_flags() {
        let times = [1.2; 8];
        for threshold in [0.01, 0.5, 2.0, 10.0] {
            let flags = detect_anomalies(&times, threshold);
            assert_eq!(flags.value(), &vec![false; 8]);
            assert_eq!(flags.reason(), Some(&Degradation::ZeroVariance { samples: 8 }));
        }
    }

    #[test]
    fn test_short_inputs() {
        assert_eq!(detect_anomalies(&[], 2.0).into_value(), Vec::<bool>::new());
        assert_eq!(detect_anomalies(&[3.0], 2.0).into_value(), vec![false]);
    }

    #[test]
    fn test_invalid_inputs_fail_safe() {
        let flags = detect_anomalies(&[0.1, f64::INFINITY, 0.2], 2.0);
        assert_eq!(flags.value(), &vec![false; 3]);
        assert!(flags.is_degraded());

        let flags = detect_anomalies(&[0.1, 5.0, 0.2], 0.0);
        assert_eq!(flags.value(), &vec![false; 3]);
        assert!(matches!(flags.reason(), Some(Degradation::InvalidInput(_))));
    }

    #[test]
    fn test_lower_threshold_flags_more() {
        let times = [0.5, 0.6, 0.55, 2.1, 0.58, 0.52];
        let strict = anomaly_ratio(detect_anomalies(&times, 2.0).value());
        let loose = anomaly_ratio(detect_anomalies(&times, 0.3).value());
        assert!(loose > strict);
    }

    #[test]
    fn test_anomaly_ratio() {
        assert_eq!(anomaly_ratio(&[]), 0.0);
        assert_eq!(anomaly_ratio(&[true, false, false, true]), 0.5);
    }
}
