//! Beta-Bernoulli reliability belief.
//!
//! Prior Beta(alpha, beta) seeded from config; each success adds one
//! pseudo-success, each failure one pseudo-failure. Posterior mean is
//! alpha / (alpha + beta).

use serde::{Deserialize, Serialize};
use statrs::distribution::{Beta, ContinuousCDF};

use crate::config::PriorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaBelief {
    pub alpha: f64,
    pub beta: f64,
}

impl BetaBelief {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    pub fn from_prior(prior: &PriorConfig) -> Self {
        Self::new(prior.alpha, prior.beta)
    }

    pub fn record_outcome(&mut self, success: bool) {
        if success {
            self.alpha += 1.0;
        } else {
            self.beta += 1.0;
        }
    }

    pub fn reliability_estimate(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    pub fn is_valid(&self) -> bool {
        self.alpha > 0.0 && self.beta > 0.0 && self.alpha.is_finite() && self.beta.is_finite()
    }

    /// Fold another belief's evidence into this one. Both must share `prior`,
    /// which is counted once.
    pub fn merge(&mut self, other: &BetaBelief, prior: &PriorConfig) {
        self.alpha += (other.alpha - prior.alpha).max(0.0);
        self.beta += (other.beta - prior.beta).max(0.0);
    }

    /// Equal-tailed credible interval for the underlying success probability.
    /// Falls back to (0, 1) when the distribution cannot be built.
    pub fn credible_interval(&self, level: f64) -> (f64, f64) {
        if !self.is_valid() || !(level > 0.0 && level < 1.0) {
            return (0.0, 1.0);
        }
        let tail = (1.0 - level) / 2.0;
        match Beta::new(self.alpha, self.beta) {
            Ok(dist) => {
                let low = dist.inverse_cdf(tail);
                let high = dist.inverse_cdf(1.0 - tail);
                let low = if low.is_finite() { low.clamp(0.0, 1.0) } else { 0.0 };
                let high = if high.is_finite() { high.clamp(0.0, 1.0) } else { 1.0 };
                (low, high)
            }
            Err(_) => (0.0, 1.0),
        }
    }
}

impl Default for BetaBelief {
    fn default() -> Self {
        Self::from_prior(&PriorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_informative_prior_updates() {
        let mut belief = BetaBelief::new(2.0, 1.0);
        belief.record_outcome(true);
        belief.record_outcome(true);
        belief.record_outcome(false);
        assert_eq!(belief, BetaBelief::new(4.0, 2.0));
        assert!((belief.reliability_estimate() - 0.6667).abs() < 1e-3);
    }

    #[test]
    fn test_uniform_prior_is_half() {
        let belief = BetaBelief::default();
        assert_eq!(belief.reliability_estimate(), 0.5);
    }

    #[test]
    fn test_estimate_stays_open_interval() {
        let mut belief = BetaBelief::default();
        for _ in 0..10_000 {
            belief.record_outcome(true);
        }
        let r = belief.reliability_estimate();
        assert!(r > 0.99 && r < 1.0);
    }

    #[test]
    fn test_parameters_only_grow() {
        let mut belief = BetaBelief::default();
        let mut last = belief;
        for success in [true, false, false, true, false] {
            belief.record_outcome(success);
            assert!(belief.alpha >= last.alpha && belief.beta >= last.beta);
            last = belief;
        }
    }

    #[test]
    fn test_merge_counts_prior_once() {
        let prior = PriorConfig { alpha: 1.0, beta: 1.0 };
        let mut a = BetaBelief::from_prior(&prior);
        let mut b = BetaBelief::from_prior(&prior);
        a.record_outcome(true);
        b.record_outcome(false);
        b.record_outcome(true);
        a.merge(&b, &prior);
        assert_eq!(a, BetaBelief::new(3.0, 2.0));
    }

    #[test]
    fn test_credible_interval_narrows_with_evidence() {
        let wide = BetaBelief::new(2.0, 2.0).credible_interval(0.95);
        let narrow = BetaBelief::new(40.0, 40.0).credible_interval(0.95);
        assert!(narrow.1 - narrow.0 < wide.1 - wide.0);
        assert!(narrow.0 < 0.5 && narrow.1 > 0.5);
    }

    #[test]
    fn test_credible_interval_invalid() {
        assert_eq!(BetaBelief::new(0.0, 1.0).credible_interval(0.95), (0.0, 1.0));
        assert_eq!(BetaBelief::new(1.0, 1.0).credible_interval(1.5), (0.0, 1.0));
    }
}
