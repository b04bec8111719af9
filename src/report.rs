//! Score reports
//!
//! プロキシごとのスコアを一覧化するための型。
//! - 合計スコアと各成分
//! - 診断情報 (信頼区間, 異常値率, レイテンシ安定性)
//! - 状態とグレード
//!
//! ランキングは合計スコアの降順、同点ならキーの昇順。

use serde::Serialize;

use crate::proxy::ProxyStatus;
use crate::scoring::composite::ProxyScore;
use crate::scoring::diagnostics::ProxyDiagnostics;

#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    pub proxy: String,
    pub score: ProxyScore,
    pub grade: &'static str,
    pub status: ProxyStatus,
    /// Set when the score is a zero fallback
    pub degraded: Option<String>,
    pub diagnostics: ProxyDiagnostics,
}

/// Format a score on the `max_score` scale as a letter grade
pub fn score_to_grade(score: f64, max_score: f64) -> &'static str {
    let pct = if max_score > 0.0 { score / max_score } else { 0.0 };
    match pct {
        s if s >= 0.9 => "A+",
        s if s >= 0.8 => "A",
        s if s >= 0.7 => "B",
        s if s >= 0.6 => "C",
        s if s >= 0.5 => "D",
        _ => "F",
    }
}

/// Sort best first; ties keep a stable order by proxy key.
pub fn rank(reports: &mut [ScoreReport]) {
    reports.sort_by(|a, b| {
        b.score
            .total_score
            .total_cmp(&a.score.total_score)
            .then_with(|| a.proxy.cmp(&b.proxy))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(proxy: &str, total: f64) -> ScoreReport {
        ScoreReport {
            proxy: proxy.to_string(),
            score: ProxyScore { total_score: total, ..ProxyScore::zero() },
            grade: score_to_grade(total, 100.0),
            status: ProxyStatus::Unknown,
            degraded: None,
            diagnostics: ProxyDiagnostics {
                success_rate_mean: 0.0,
                success_interval: (0.0, 0.0),
                anomaly_count: 0,
                anomaly_ratio: 0.0,
                latency_stability: 1.0,
                reliability: 0.5,
                credible_interval: (0.0, 1.0),
                notes: Vec::new(),
            },
        }
    }

    #[test]
    fn test_grades() {
        assert_eq!(score_to_grade(95.0, 100.0), "A+");
        assert_eq!(score_to_grade(80.5, 100.0), "A");
        assert_eq!(score_to_grade(70.0, 100.0), "B");
        assert_eq!(score_to_grade(65.0, 100.0), "C");
        assert_eq!(score_to_grade(50.0, 100.0), "D");
        assert_eq!(score_to_grade(12.0, 100.0), "F");
        assert_eq!(score_to_grade(45.0, 50.0), "A+");
        assert_eq!(score_to_grade(10.0, 0.0), "F");
    }

    #[test]
    fn test_rank_orders_by_total_then_key() {
        let mut reports = vec![
            report("10.0.0.2:8080", 40.0),
            report("10.0.0.3:8080", 88.0),
            report("10.0.0.1:8080", 40.0),
            report("10.0.0.4:8080", 0.0),
        ];
        rank(&mut reports);
        let order: Vec<&str> = reports.iter().map(|r| r.proxy.as_str()).collect();
        assert_eq!(order, vec!["10.0.0.3:8080", "10.0.0.1:8080", "10.0.0.2:8080", "10.0.0.4:8080"]);
    }
}
