use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::proxy::{OutcomeSample, ProxyMetrics, ProxyStatus};
use crate::report::{rank, score_to_grade, ScoreReport};
use crate::scoring::composite::{CompositeScorer, ProxyScore};
use crate::scoring::diagnostics::ProxyDiagnostics;
use crate::scoring::Estimate;

/// Per-proxy state: metrics behind their own lock so updates to one proxy
/// never wait on another.
type ProxyEntry = Arc<Mutex<ProxyMetrics>>;

pub struct ProxyPool {
    config: Arc<Config>,
    scorer: CompositeScorer,
    proxies: DashMap<String, ProxyEntry>,
    // Stats
    samples_recorded: AtomicU64,
    samples_rejected: AtomicU64,
    scores_computed: AtomicU64,
    scores_degraded: AtomicU64,
}

impl ProxyPool {
    pub fn new(config: Arc<Config>) -> Self {
        let scorer = CompositeScorer::new(&config.scoring);
        info!(
            "Proxy pool initialized (confidence {:.2}, z threshold {:.1}, tau {}h)",
            config.scoring.confidence_level, config.scoring.anomaly_z_threshold, config.scoring.decay_tau_hours
        );
        Self {
            config,
            scorer,
            proxies: DashMap::new(),
            samples_recorded: AtomicU64::new(0),
            samples_rejected: AtomicU64::new(0),
            scores_computed: AtomicU64::new(0),
            scores_degraded: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn entry(&self, proxy: &str) -> ProxyEntry {
        if let Some(existing) = self.proxies.get(proxy) {
            return existing.clone();
        }
        self.proxies
            .entry(proxy.to_string())
            .or_insert_with(|| {
                debug!("Tracking new proxy {}", proxy);
                Arc::new(Mutex::new(ProxyMetrics::from_config(&self.config)))
            })
            .clone()
    }

    /// Record one validation result. Returns false when the sample is
    /// rejected (negative or non-finite response time).
    pub fn record(&self, proxy: &str, sample: OutcomeSample) -> bool {
        if !(sample.response_time_secs.is_finite() && sample.response_time_secs >= 0.0) {
            warn!("Rejected sample for {}: response time {}", proxy, sample.response_time_secs);
            self.samples_rejected.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let entry = self.entry(proxy);
        entry.lock().record(&sample);
        self.samples_recorded.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Copy of a proxy's metrics, taken under its lock.
    pub fn snapshot(&self, proxy: &str) -> Option<ProxyMetrics> {
        let entry = self.proxies.get(proxy)?.clone();
        let metrics = entry.lock().clone();
        Some(metrics)
    }

    pub fn remove(&self, proxy: &str) -> Option<ProxyMetrics> {
        let (_, entry) = self.proxies.remove(proxy)?;
        let metrics = entry.lock().clone();
        Some(metrics)
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.proxies.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn reliability_estimate(&self, proxy: &str) -> Option<f64> {
        let entry = self.proxies.get(proxy)?.clone();
        let estimate = entry.lock().belief.reliability_estimate();
        Some(estimate)
    }

    pub fn score(&self, proxy: &str, now: DateTime<Utc>) -> Option<Estimate<ProxyScore>> {
        let metrics = self.snapshot(proxy)?;
        Some(self.score_metrics(proxy, &metrics, now))
    }

    fn score_metrics(&self, proxy: &str, metrics: &ProxyMetrics, now: DateTime<Utc>) -> Estimate<ProxyScore> {
        let score = self.scorer.calculate_detailed_score(metrics, now);
        self.scores_computed.fetch_add(1, Ordering::Relaxed);
        if let Some(reason) = score.reason() {
            self.scores_degraded.fetch_add(1, Ordering::Relaxed);
            warn!("Proxy {} scored as zero: {}", proxy, reason);
        }
        score
    }

    pub fn report(&self, proxy: &str, now: DateTime<Utc>) -> Option<ScoreReport> {
        let metrics = self.snapshot(proxy)?;
        Some(self.build_report(proxy, &metrics, now))
    }

    fn build_report(&self, proxy: &str, metrics: &ProxyMetrics, now: DateTime<Utc>) -> ScoreReport {
        let scoring = &self.config.scoring;
        let score = self.score_metrics(proxy, metrics, now);
        let degraded = score.reason().map(|r| r.to_string());
        let score = score.into_value();
        let status = metrics.status(&self.config.status, scoring.failure_tolerance);

        ScoreReport {
            proxy: proxy.to_string(),
            grade: score_to_grade(score.total_score, scoring.max_score),
            score,
            status,
            degraded,
            diagnostics: ProxyDiagnostics::collect(metrics, scoring),
        }
    }

    /// Score every tracked proxy, best first.
    pub fn evaluate_all(&self, now: DateTime<Utc>) -> Vec<ScoreReport> {
        // Snapshot first so no proxy lock is held while scoring
        let snapshots: Vec<(String, ProxyMetrics)> = self
            .proxies
            .iter()
            .map(|e| (e.key().clone(), e.value().lock().clone()))
            .collect();

        let mut reports: Vec<ScoreReport> = snapshots
            .iter()
            .map(|(proxy, metrics)| self.build_report(proxy, metrics, now))
            .collect();
        rank(&mut reports);

        let failed = reports.iter().filter(|r| r.status == ProxyStatus::Failed).count();
        debug!("Evaluated {} proxies ({} failed)", reports.len(), failed);
        reports
    }

    /// Get pool stats
    pub fn get_stats(&self) -> serde_json::Value {
        serde_json::json!({
            "proxies": self.proxies.len(),
            "samples_recorded": self.samples_recorded.load(Ordering::Relaxed),
            "samples_rejected": self.samples_rejected.load(Ordering::Relaxed),
            "scores_computed": self.scores_computed.load(Ordering::Relaxed),
            "scores_degraded": self.scores_degraded.load(Ordering::Relaxed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn pool() -> ProxyPool {
        ProxyPool::new(Arc::new(Config::default()))
    }

    #[test]
    fn test_record_creates_entry_from_prior() {
        let pool = pool();
        let now = Utc::now();
        assert!(pool.is_empty());
        assert!(pool.record("1.2.3.4:8080", OutcomeSample::success(0.4, now)));
        let m = pool.snapshot("1.2.3.4:8080").unwrap();
        assert_eq!(m.total_requests, 1);
        assert_eq!(m.belief.alpha, 2.0);
        assert_eq!(pool.reliability_estimate("1.2.3.4:8080"), Some(2.0 / 3.0));
    }

    #[test]
    fn test_rejects_invalid_samples() {
        let pool = pool();
        let now = Utc::now();
        assert!(!pool.record("a:1", OutcomeSample::success(-1.0, now)));
        assert!(!pool.record("a:1", OutcomeSample::success(f64::NAN, now)));
        assert!(pool.snapshot("a:1").is_none());
        assert_eq!(pool.get_stats()["samples_rejected"], 2);
    }

    #[test]
    fn test_unknown_proxy() {
        let pool = pool();
        assert!(pool.score("nope:1", Utc::now()).is_none());
        assert!(pool.report("nope:1", Utc::now()).is_none());
        assert!(pool.reliability_estimate("nope:1").is_none());
    }

    #[test]
    fn test_evaluate_all_ranks_best_first() {
        let pool = pool();
        let now = Utc::now();
        for i in 0..10 {
            let t = now - Duration::minutes(10 - i);
            pool.record("good:1", OutcomeSample::success(0.3, t));
            pool.record("bad:1", OutcomeSample::failure(8.0, t));
            pool.record("mixed:1", OutcomeSample { success: i % 2 == 0, response_time_secs: 2.0, timestamp: t });
        }

        let reports = pool.evaluate_all(now);
        let order: Vec<&str> = reports.iter().map(|r| r.proxy.as_str()).collect();
        assert_eq!(order, vec!["good:1", "mixed:1", "bad:1"]);
        assert_eq!(reports[0].status, ProxyStatus::Active);
        assert_eq!(reports[2].status, ProxyStatus::Failed);
        assert!(reports.iter().all(|r| r.degraded.is_none()));
        assert_eq!(pool.get_stats()["scores_computed"], 3);
    }

    #[test]
    fn test_remove() {
        let pool = pool();
        pool.record("x:1", OutcomeSample::success(0.1, Utc::now()));
        assert!(pool.remove("x:1").is_some());
        assert!(pool.is_empty());
        assert!(pool.remove("x:1").is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_are_not_lost() {
        let pool = Arc::new(pool());
        let now = Utc::now();
        let mut handles = Vec::new();
        for worker in 0..8 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..250 {
                    let success = (worker + i) % 3 != 0;
                    pool.record("shared:3128", OutcomeSample { success, response_time_secs: 0.5, timestamp: now });
                    if i % 50 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let m = pool.snapshot("shared:3128").unwrap();
        assert_eq!(m.total_requests, 2000);
        // prior (1, 1) plus one increment per sample
        assert_eq!(m.belief.alpha + m.belief.beta, 2002.0);
        assert_eq!(m.belief.alpha - 1.0, m.total_successes as f64);
        assert_eq!(m.response_times.len(), 100);
    }
}
