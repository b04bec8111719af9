use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{Config, PriorConfig, StatusConfig, WindowConfig};
use crate::scoring::reliability::BetaBelief;

/// One validation result reported by a checker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSample {
    pub success: bool,
    pub response_time_secs: f64,
    pub timestamp: DateTime<Utc>,
}

impl OutcomeSample {
    pub fn success(response_time_secs: f64, timestamp: DateTime<Utc>) -> Self {
        Self { success: true, response_time_secs, timestamp }
    }

    pub fn failure(response_time_secs: f64, timestamp: DateTime<Utc>) -> Self {
        Self { success: false, response_time_secs, timestamp }
    }
}

/// Measurement history for one proxy as handed over by the validation side.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyHistory {
    pub proxy: String,
    pub samples: Vec<OutcomeSample>,
}

impl ProxyHistory {
    /// Samples in chronological order.
    pub fn sorted_samples(&self) -> Vec<OutcomeSample> {
        let mut samples = self.samples.clone();
        samples.sort_by_key(|s| s.timestamp);
        samples
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyStatus {
    Unknown,
    Active,
    Unstable,
    Failed,
}

/// Accumulated measurement history for one proxy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProxyMetrics {
    /// Per-check outcome (1.0 success, 0.0 failure), oldest first; its mean is
    /// the success rate over the recent window
    pub success_rates: VecDeque<f64>,
    /// Response times in seconds, oldest first
    pub response_times: VecDeque<f64>,
    pub belief: BetaBelief,
    pub consecutive_failures: u32,
    pub last_success: Option<DateTime<Utc>>,
    pub last_check: Option<DateTime<Utc>>,
    pub total_requests: u64,
    pub total_successes: u64,
    #[serde(skip)]
    window: WindowConfig,
}

impl ProxyMetrics {
    pub fn new(prior: &PriorConfig, window: WindowConfig) -> Self {
        Self {
            success_rates: VecDeque::with_capacity(window.success_rates.min(1024)),
            response_times: VecDeque::with_capacity(window.response_times.min(1024)),
            belief: BetaBelief::from_prior(prior),
            consecutive_failures: 0,
            last_success: None,
            last_check: None,
            total_requests: 0,
            total_successes: 0,
            window,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.prior, config.window)
    }

    /// Apply one validation result to every part of the history.
    pub fn record(&mut self, sample: &OutcomeSample) {
        self.total_requests += 1;
        self.belief.record_outcome(sample.success);

        if sample.success {
            self.total_successes += 1;
            self.consecutive_failures = 0;
            self.last_success = Some(match self.last_success {
                Some(prev) => prev.max(sample.timestamp),
                None => sample.timestamp,
            });
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        }
        self.last_check = Some(match self.last_check {
            Some(prev) => prev.max(sample.timestamp),
            None => sample.timestamp,
        });

        let outcome = if sample.success { 1.0 } else { 0.0 };
        push_bounded(&mut self.success_rates, outcome, self.window.success_rates);
        push_bounded(&mut self.response_times, sample.response_time_secs, self.window.response_times);
    }

    pub fn success_rate_slice(&self) -> Vec<f64> {
        self.success_rates.iter().copied().collect()
    }

    pub fn response_time_slice(&self) -> Vec<f64> {
        self.response_times.iter().copied().collect()
    }

    /// Mean of the response-time window, 0 when no checks have run.
    pub fn avg_response_time(&self) -> f64 {
        if self.response_times.is_empty() {
            return 0.0;
        }
        self.response_times.iter().sum::<f64>() / self.response_times.len() as f64
    }

    pub fn status(&self, status: &StatusConfig, failure_tolerance: u32) -> ProxyStatus {
        if self.total_requests == 0 {
            return ProxyStatus::Unknown;
        }
        if self.consecutive_failures >= failure_tolerance {
            return ProxyStatus::Failed;
        }
        let rate = self.total_successes as f64 / self.total_requests as f64;
        if rate >= status.active_success_rate {
            ProxyStatus::Active
        } else {
            ProxyStatus::Unstable
        }
    }
}

fn push_bounded(window: &mut VecDeque<f64>, value: f64, cap: usize) {
    window.push_back(value);
    while window.len() > cap {
        window.pop_front();
    }
}
