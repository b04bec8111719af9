use serde::Serialize;

use crate::config::ScoringConfig;
use crate::proxy::ProxyMetrics;
use super::anomaly::{anomaly_ratio, detect_anomalies};
use super::confidence::{confidence_interval, sample_mean};
use super::{mean, std_dev};

/// Supporting data kept next to a score. None of it feeds the total; a wide
/// success interval or a high anomaly ratio explains a score, it does not
/// change it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProxyDiagnostics {
    pub success_rate_mean: f64,
    pub success_interval: (f64, f64),
    pub anomaly_count: usize,
    pub anomaly_ratio: f64,
    pub latency_stability: f64,
    pub reliability: f64,
    pub credible_interval: (f64, f64),
    /// Reasons any estimator fell back to its default
    pub notes: Vec<String>,
}

impl ProxyDiagnostics {
    pub fn collect(metrics: &ProxyMetrics, config: &ScoringConfig) -> Self {
        let rates = metrics.success_rate_slice();
        let times = metrics.response_time_slice();
        let mut notes = Vec::new();

        let interval = confidence_interval(&rates, config.confidence_level, config.min_samples);
        if let Some(reason) = interval.reason() {
            notes.push(format!("success interval: {}", reason));
        }

        let flags = detect_anomalies(&times, config.anomaly_z_threshold);
        if let Some(reason) = flags.reason() {
            notes.push(format!("anomaly detection: {}", reason));
        }
        let flags = flags.into_value();

        Self {
            success_rate_mean: sample_mean(&rates).unwrap_or(0.0),
            success_interval: interval.into_value(),
            anomaly_count: flags.iter().filter(|f| **f).count(),
            anomaly_ratio: anomaly_ratio(&flags),
            latency_stability: latency_stability(&times),
            reliability: metrics.belief.reliability_estimate(),
            credible_interval: metrics.belief.credible_interval(config.confidence_level),
            notes,
        }
    }
}

/// 1 - coefficient of variation, clamped to [0, 1]. Fewer than two samples or
/// a zero mean is not enough evidence of instability and yields 1.
pub fn latency_stability(times: &[f64]) -> f64 {
    if times.len() < 2 {
        return 1.0;
    }
    let Some(avg) = mean(times) else { return 1.0 };
    if avg == 0.0 {
        return 1.0;
    }
    match std_dev(times, avg, 0) {
        Some(sd) if sd.is_finite() && avg.is_finite() => (1.0 - (sd / avg).min(1.0)).max(0.0),
        _ => 0.0,
    }
}
