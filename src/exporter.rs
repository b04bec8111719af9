//! Prometheus text exposition of pool scores.
//!
//! Rendered on demand from an evaluation run; the caller decides where the
//! text goes (stdout from the CLI, or an HTTP handler in the host process).

use std::fmt::Write;

use crate::pool::ProxyPool;
use crate::proxy::ProxyStatus;
use crate::report::ScoreReport;

/// Generate Prometheus-format metrics text
pub fn render_metrics(pool: &ProxyPool, reports: &[ScoreReport]) -> String {
    let mut out = String::with_capacity(256 + reports.len() * 512);

    // ──────────────────────────────────────────────
    // Pool totals
    // ──────────────────────────────────────────────
    let stats = pool.get_stats();
    let recorded = stats["samples_recorded"].as_u64().unwrap_or(0);
    let rejected = stats["samples_rejected"].as_u64().unwrap_or(0);
    let degraded = stats["scores_degraded"].as_u64().unwrap_or(0);

    write_help_type(&mut out, "proxyscore_proxies", "Number of tracked proxies.", "gauge");
    writeln!(out, "proxyscore_proxies {}", pool.len()).ok();

    write_help_type(&mut out, "proxyscore_samples_recorded_total", "Validation results applied to proxy histories.", "counter");
    writeln!(out, "proxyscore_samples_recorded_total {}", recorded).ok();

    write_help_type(&mut out, "proxyscore_samples_rejected_total", "Validation results rejected as malformed.", "counter");
    writeln!(out, "proxyscore_samples_rejected_total {}", rejected).ok();

    write_help_type(&mut out, "proxyscore_scores_degraded_total", "Scoring calls that fell back to a zero score.", "counter");
    writeln!(out, "proxyscore_scores_degraded_total {}", degraded).ok();

    // ──────────────────────────────────────────────
    // Status breakdown
    // ──────────────────────────────────────────────
    write_help_type(&mut out, "proxyscore_proxies_by_status", "Tracked proxies by derived status.", "gauge");
    for (status, label) in [
        (ProxyStatus::Active, "active"),
        (ProxyStatus::Unstable, "unstable"),
        (ProxyStatus::Failed, "failed"),
        (ProxyStatus::Unknown, "unknown"),
    ] {
        let count = reports.iter().filter(|r| r.status == status).count();
        writeln!(out, "proxyscore_proxies_by_status{{status=\"{}\"}} {}", label, count).ok();
    }

    // ──────────────────────────────────────────────
    // Per-proxy scores
    // ──────────────────────────────────────────────
    write_help_type(&mut out, "proxyscore_total_score", "Composite quality score per proxy.", "gauge");
    write_help_type(&mut out, "proxyscore_component_score", "Component sub-score per proxy.", "gauge");
    write_help_type(&mut out, "proxyscore_reliability", "Beta posterior mean per proxy (0.0-1.0).", "gauge");
    write_help_type(&mut out, "proxyscore_anomaly_ratio", "Fraction of response times flagged as anomalies.", "gauge");

    for r in reports {
        let s = &r.score;
        let proxy = escape_label(&r.proxy);
        writeln!(out, "proxyscore_total_score{{proxy=\"{}\"}} {:.3}", proxy, s.total_score).ok();
        for (component, value) in [
            ("success_rate", s.success_rate_score),
            ("response_time", s.response_time_score),
            ("stability", s.stability_score),
            ("recency", s.recency_score),
            ("reliability", s.reliability_score),
        ] {
            writeln!(
                out,
                "proxyscore_component_score{{proxy=\"{}\",component=\"{}\"}} {:.3}",
                proxy, component, value
            )
            .ok();
        }
        writeln!(out, "proxyscore_reliability{{proxy=\"{}\"}} {:.4}", proxy, r.diagnostics.reliability).ok();
        writeln!(out, "proxyscore_anomaly_ratio{{proxy=\"{}\"}} {:.4}", proxy, r.diagnostics.anomaly_ratio).ok();
    }

    write_help_type(&mut out, "proxyscore_build_info", "proxy-score build information.", "gauge");
    writeln!(out, "proxyscore_build_info{{version=\"{}\"}} 1", env!("CARGO_PKG_VERSION")).ok();

    out
}

// ── helpers ─────────────────────────────────────────

fn write_help_type(out: &mut String, name: &str, help: &str, metric_type: &str) {
    writeln!(out, "# HELP {} {}", name, help).ok();
    writeln!(out, "# TYPE {} {}", name, metric_type).ok();
}

/// Label values may not carry a raw backslash, quote or newline.
fn escape_label(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use chrono::Utc;
    use crate::config::Config;
    use crate::proxy::OutcomeSample;

    #[test]
    fn test_render_contains_per_proxy_lines() {
        let pool = ProxyPool::new(Arc::new(Config::default()));
        let now = Utc::now();
        pool.record("10.1.1.1:80", OutcomeSample::success(0.2, now));
        pool.record("10.1.1.1:80", OutcomeSample::success(0.3, now));
        pool.record("10.1.1.2:80", OutcomeSample::failure(5.0, now));

        let reports = pool.evaluate_all(now);
        let text = render_metrics(&pool, &reports);

        assert!(text.contains("# TYPE proxyscore_total_score gauge"));
        assert!(text.contains("proxyscore_proxies 2"));
        assert!(text.contains("proxyscore_samples_recorded_total 3"));
        assert!(text.contains("proxyscore_total_score{proxy=\"10.1.1.1:80\"}"));
        assert!(text.contains("proxyscore_component_score{proxy=\"10.1.1.2:80\",component=\"stability\"}"));
        assert!(text.contains("proxyscore_proxies_by_status{status=\"active\"} 1"));
        assert!(text.contains("proxyscore_proxies_by_status{status=\"unstable\"} 1"));
    }

    #[test]
    fn test_proxy_label_is_escaped() {
        let pool = ProxyPool::new(Arc::new(Config::default()));
        let now = Utc::now();
        pool.record("bad\"key\\with\nbreak", OutcomeSample::success(0.2, now));

        let reports = pool.evaluate_all(now);
        let text = render_metrics(&pool, &reports);

        assert!(text.contains(r#"proxyscore_total_score{proxy="bad\"key\\with\nbreak"}"#));
        assert!(text.lines().all(|l| !l.starts_with("break")));
    }

    #[test]
    fn test_escape_label() {
        assert_eq!(escape_label("10.0.0.1:8080"), "10.0.0.1:8080");
        assert_eq!(escape_label(r#"a"b"#), r#"a\"b"#);
        assert_eq!(escape_label(r"a\b"), r"a\\b");
        assert_eq!(escape_label("a\nb"), r"a\nb");
    }

    #[test]
    fn test_render_empty_pool() {
        let pool = ProxyPool::new(Arc::new(Config::default()));
        let text = render_metrics(&pool, &[]);
        assert!(text.contains("proxyscore_proxies 0"));
        assert!(!text.contains("proxyscore_total_score{"));
    }
}
