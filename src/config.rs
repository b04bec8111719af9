use serde::Deserialize;

/// Tolerance used when checking that weights agree with component scales.
const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub prior: PriorConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    /// Confidence level for the success-rate interval (0.0 - 1.0, exclusive)
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
    /// |z| above which a response time counts as an anomaly
    #[serde(default = "default_z_threshold")]
    pub anomaly_z_threshold: f64,
    /// Recency decay time constant in hours
    #[serde(default = "default_decay_tau")]
    pub decay_tau_hours: f64,
    /// Minimum number of observations before an interval is computed
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
    /// Response-time points lost per second of average latency
    #[serde(default = "default_latency_penalty")]
    pub latency_penalty_per_sec: f64,
    /// Consecutive failures at which stability drops to zero
    #[serde(default = "default_failure_tolerance")]
    pub failure_tolerance: u32,
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    #[serde(default = "default_max_score")]
    pub max_score: f64,
    #[serde(default)]
    pub weights: ComponentWeights,
    #[serde(default)]
    pub scales: ComponentScales,
}

/// Relative importance of each component in the total score.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ComponentWeights {
    #[serde(default = "default_success_weight")]
    pub success_rate: f64,
    #[serde(default = "default_response_weight")]
    pub response_time: f64,
    #[serde(default = "default_stability_weight")]
    pub stability: f64,
    #[serde(default = "default_recency_weight")]
    pub recency: f64,
    #[serde(default = "default_reliability_weight")]
    pub reliability: f64,
}

/// Upper bound of each component sub-score.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ComponentScales {
    #[serde(default = "default_success_scale")]
    pub success_rate: f64,
    #[serde(default = "default_response_scale")]
    pub response_time: f64,
    #[serde(default = "default_stability_scale")]
    pub stability: f64,
    #[serde(default = "default_recency_scale")]
    pub recency: f64,
    #[serde(default = "default_reliability_scale")]
    pub reliability: f64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct PriorConfig {
    /// Pseudo-successes seeded into every new proxy's belief
    #[serde(default = "default_prior")]
    pub alpha: f64,
    /// Pseudo-failures seeded into every new proxy's belief
    #[serde(default = "default_prior")]
    pub beta: f64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    #[serde(default = "default_window")]
    pub success_rates: usize,
    #[serde(default = "default_window")]
    pub response_times: usize,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct StatusConfig {
    /// Success rate at or above which a proxy is considered active
    #[serde(default = "default_active_rate")]
    pub active_success_rate: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            confidence_level: default_confidence_level(),
            anomaly_z_threshold: default_z_threshold(),
            decay_tau_hours: default_decay_tau(),
            min_samples: default_min_samples(),
            latency_penalty_per_sec: default_latency_penalty(),
            failure_tolerance: default_failure_tolerance(),
            min_score: default_min_score(),
            max_score: default_max_score(),
            weights: ComponentWeights::default(),
            scales: ComponentScales::default(),
        }
    }
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            success_rate: default_success_weight(),
            response_time: default_response_weight(),
            stability: default_stability_weight(),
            recency: default_recency_weight(),
            reliability: default_reliability_weight(),
        }
    }
}

impl Default for ComponentScales {
    fn default() -> Self {
        Self {
            success_rate: default_success_scale(),
            response_time: default_response_scale(),
            stability: default_stability_scale(),
            recency: default_recency_scale(),
            reliability: default_reliability_scale(),
        }
    }
}

impl Default for PriorConfig {
    fn default() -> Self {
        Self { alpha: default_prior(), beta: default_prior() }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { success_rates: default_window(), response_times: default_window() }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self { active_success_rate: default_active_rate() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), format: LogFormat::default() }
    }
}

impl ComponentWeights {
    pub fn as_array(&self) -> [f64; 5] {
        [self.success_rate, self.response_time, self.stability, self.recency, self.reliability]
    }
}

impl ComponentScales {
    pub fn as_array(&self) -> [f64; 5] {
        [self.success_rate, self.response_time, self.stability, self.recency, self.reliability]
    }

    pub fn total(&self) -> f64 {
        self.as_array().iter().sum()
    }
}

const COMPONENT_NAMES: [&str; 5] = ["success_rate", "response_time", "stability", "recency", "reliability"];

// Default value functions
fn default_confidence_level() -> f64 { 0.95 }
fn default_z_threshold() -> f64 { 2.0 }
fn default_decay_tau() -> f64 { 24.0 }
fn default_min_samples() -> usize { 2 }
fn default_latency_penalty() -> f64 { 2.5 }
fn default_failure_tolerance() -> u32 { 5 }
fn default_min_score() -> f64 { 0.0 }
fn default_max_score() -> f64 { 100.0 }
fn default_success_weight() -> f64 { 0.4 }
fn default_response_weight() -> f64 { 0.25 }
fn default_stability_weight() -> f64 { 0.15 }
fn default_recency_weight() -> f64 { 0.1 }
fn default_reliability_weight() -> f64 { 0.1 }
fn default_success_scale() -> f64 { 40.0 }
fn default_response_scale() -> f64 { 25.0 }
fn default_stability_scale() -> f64 { 15.0 }
fn default_recency_scale() -> f64 { 10.0 }
fn default_reliability_scale() -> f64 { 10.0 }
fn default_prior() -> f64 { 1.0 }
fn default_window() -> usize { 100 }
fn default_active_rate() -> f64 { 0.8 }
fn default_log_level() -> String { "proxy_score=info".to_string() }

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path, e))?;
        Self::from_toml(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path, e))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.scoring.validate()?;

        if !(self.prior.alpha > 0.0 && self.prior.alpha.is_finite())
            || !(self.prior.beta > 0.0 && self.prior.beta.is_finite())
        {
            anyhow::bail!(
                "prior alpha/beta must be positive and finite (got {}, {})",
                self.prior.alpha, self.prior.beta
            );
        }
        if self.window.success_rates == 0 || self.window.response_times == 0 {
            anyhow::bail!("history windows must hold at least one entry");
        }
        if !(0.0..=1.0).contains(&self.status.active_success_rate) {
            anyhow::bail!(
                "status.active_success_rate must be within [0, 1] (got {})",
                self.status.active_success_rate
            );
        }
        Ok(())
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            anyhow::bail!("confidence_level must be in (0, 1) (got {})", self.confidence_level);
        }
        if !(self.anomaly_z_threshold > 0.0 && self.anomaly_z_threshold.is_finite()) {
            anyhow::bail!("anomaly_z_threshold must be positive (got {})", self.anomaly_z_threshold);
        }
        if !(self.decay_tau_hours > 0.0 && self.decay_tau_hours.is_finite()) {
            anyhow::bail!("decay_tau_hours must be positive (got {})", self.decay_tau_hours);
        }
        if self.min_samples < 2 {
            anyhow::bail!("min_samples must be at least 2 (got {})", self.min_samples);
        }
        if !(self.latency_penalty_per_sec >= 0.0 && self.latency_penalty_per_sec.is_finite()) {
            anyhow::bail!("latency_penalty_per_sec must be non-negative");
        }
        if self.failure_tolerance == 0 {
            anyhow::bail!("failure_tolerance must be at least 1");
        }
        if !(self.min_score.is_finite() && self.max_score.is_finite() && self.min_score < self.max_score) {
            anyhow::bail!(
                "score bounds must satisfy min_score < max_score (got {}..{})",
                self.min_score, self.max_score
            );
        }

        let weights = self.weights.as_array();
        let scales = self.scales.as_array();
        for (name, w) in COMPONENT_NAMES.iter().zip(weights) {
            if !(w >= 0.0 && w.is_finite()) {
                anyhow::bail!("weight for {} must be non-negative (got {})", name, w);
            }
        }
        for (name, s) in COMPONENT_NAMES.iter().zip(scales) {
            if !(s > 0.0 && s.is_finite()) {
                anyhow::bail!("scale for {} must be positive (got {})", name, s);
            }
        }

        // Scales and weights both encode importance; they must agree.
        let scale_total = self.scales.total();
        for ((name, w), s) in COMPONENT_NAMES.iter().zip(weights).zip(scales) {
            let implied = s / scale_total;
            if (w - implied).abs() > WEIGHT_TOLERANCE {
                anyhow::bail!(
                    "weight for {} is {} but its scale {} of {} implies {:.4}",
                    name, w, s, scale_total, implied
                );
            }
        }
        Ok(())
    }
}
