use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ScoringConfig;
use crate::proxy::ProxyMetrics;
use super::confidence::sample_mean;
use super::recency::{decay_weight, hours_between};
use super::{Degradation, Estimate};

/// Scored snapshot of one proxy. Each component is bounded by its configured
/// scale; `total_score` by the configured score bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProxyScore {
    pub total_score: f64,
    pub success_rate_score: f64,
    pub response_time_score: f64,
    pub stability_score: f64,
    pub recency_score: f64,
    pub reliability_score: f64,
}

impl ProxyScore {
    pub fn zero() -> Self {
        Self::floor(0.0)
    }

    /// All components zero, total pinned at the lowest allowed score.
    pub fn floor(min_score: f64) -> Self {
        Self {
            total_score: min_score,
            success_rate_score: 0.0,
            response_time_score: 0.0,
            stability_score: 0.0,
            recency_score: 0.0,
            reliability_score: 0.0,
        }
    }

    fn components(&self) -> [f64; 5] {
        [
            self.success_rate_score,
            self.response_time_score,
            self.stability_score,
            self.recency_score,
            self.reliability_score,
        ]
    }
}

/// Composite Scorer
///
/// success rate, latency, stability, recency and Bayesian reliability are each
/// scaled to their own maximum and then combined with the configured weights:
///
///   total = Σ weight_i × (component_i / scale_i) × max_score
///
/// Config validation keeps every weight equal to scale_i / Σ scale, so with the
/// defaults (40/25/15/10/10) the total is the plain sum of the components.
pub struct CompositeScorer {
    config: ScoringConfig,
}

impl CompositeScorer {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a metrics snapshot as of `now`.
    ///
    /// Never fails: malformed metrics or a numerical failure yield zero
    /// components and a `min_score` total tagged with the reason, which sorts
    /// the proxy to the bottom.
    pub fn calculate_detailed_score(&self, metrics: &ProxyMetrics, now: DateTime<Utc>) -> Estimate<ProxyScore> {
        match self.try_score(metrics, now) {
            Ok(score) => Estimate::Computed(score),
            Err(reason) => {
                warn!("Scoring failed, falling back to zero score: {}", reason);
                Estimate::degraded(ProxyScore::floor(self.config.min_score), reason)
            }
        }
    }

    fn try_score(&self, metrics: &ProxyMetrics, now: DateTime<Utc>) -> Result<ProxyScore, Degradation> {
        check_metrics(metrics)?;
        let scales = &self.config.scales;

        let success_rate = sample_mean(&metrics.success_rate_slice()).unwrap_or(0.0);
        let success_rate_score = (success_rate * scales.success_rate).clamp(0.0, scales.success_rate);

        let avg_latency = metrics.avg_response_time();
        let response_time_score = (scales.response_time - avg_latency * self.config.latency_penalty_per_sec)
            .clamp(0.0, scales.response_time);

        let failure_ratio =
            (metrics.consecutive_failures as f64 / self.config.failure_tolerance as f64).min(1.0);
        let stability_score = (scales.stability * (1.0 - failure_ratio)).clamp(0.0, scales.stability);

        let recency_weight = match metrics.last_success {
            Some(last) => {
                let weight = decay_weight(hours_between(last, now), self.config.decay_tau_hours);
                match weight.reason() {
                    None => *weight.value(),
                    Some(Degradation::ClockSkew { hours }) => {
                        debug!("Last success {:.3}h ahead of scoring time, treating as fresh", -hours);
                        *weight.value()
                    }
                    Some(other) => return Err(other.clone()),
                }
            }
            None => 0.0,
        };
        let recency_score = (scales.recency * recency_weight).clamp(0.0, scales.recency);

        let reliability_score =
            (scales.reliability * metrics.belief.reliability_estimate()).clamp(0.0, scales.reliability);

        let mut score = ProxyScore {
            total_score: 0.0,
            success_rate_score,
            response_time_score,
            stability_score,
            recency_score,
            reliability_score,
        };
        score.total_score = self.weighted_total(&score)?;
        Ok(score)
    }

    fn weighted_total(&self, score: &ProxyScore) -> Result<f64, Degradation> {
        let weights = self.config.weights.as_array();
        let scales = self.config.scales.as_array();

        let total: f64 = score
            .components()
            .iter()
            .zip(weights)
            .zip(scales)
            .map(|((component, weight), scale)| weight * (component / scale) * self.config.max_score)
            .sum();

        if !total.is_finite() {
            return Err(Degradation::Numerical(format!("total score {}", total)));
        }
        Ok(total.clamp(self.config.min_score, self.config.max_score))
    }
}

fn check_metrics(metrics: &ProxyMetrics) -> Result<(), Degradation> {
    if !metrics.belief.is_valid() {
        return Err(Degradation::InvalidInput(format!(
            "belief alpha={} beta={}",
            metrics.belief.alpha, metrics.belief.beta
        )));
    }
    if let Some(bad) = metrics.success_rates.iter().find(|r| !(0.0..=1.0).contains(*r)) {
        return Err(Degradation::InvalidInput(format!("success rate {}", bad)));
    }
    if let Some(bad) = metrics.response_times.iter().find(|t| !(t.is_finite() && **t >= 0.0)) {
        return Err(Degradation::InvalidInput(format!("response time {}", bad)));
    }
    Ok(())
}
