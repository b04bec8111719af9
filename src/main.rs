use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use proxy_score::config::{Config, LogFormat, LoggingConfig};
use proxy_score::exporter::render_metrics;
use proxy_score::{ProxyHistory, ProxyPool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let metrics_mode = take_flag(&mut args, "--metrics");

    // Load config
    let config_path = args
        .first()
        .cloned()
        .unwrap_or_else(|| "proxy-score.toml".to_string());
    let config_found = Path::new(&config_path).exists();
    let config = if config_found {
        Config::load(&config_path)?
    } else {
        Config::default()
    };

    // Initialize tracing
    init_tracing(&config.logging);
    info!("proxy-score v{} starting...", env!("CARGO_PKG_VERSION"));
    if config_found {
        info!("Config loaded from {}", config_path);
    } else {
        warn!("Config file {} not found, using defaults", config_path);
    }

    let histories = read_snapshot(args.get(1).map(String::as_str)).await?;
    info!("Snapshot holds {} proxies", histories.len());

    let pool = Arc::new(ProxyPool::new(Arc::new(config)));

    // Replay each proxy's history on its own task; samples for one proxy stay in order
    let mut tasks = Vec::with_capacity(histories.len());
    for history in histories {
        let pool = pool.clone();
        tasks.push(tokio::spawn(async move {
            let mut rejected = 0usize;
            for sample in history.sorted_samples() {
                if !pool.record(&history.proxy, sample) {
                    rejected += 1;
                }
            }
            if rejected > 0 {
                warn!("{}: {} samples rejected", history.proxy, rejected);
            }
        }));
    }
    for task in tasks {
        task.await?;
    }

    let reports = pool.evaluate_all(Utc::now());
    info!("Scored {} proxies ({})", reports.len(), pool.get_stats());

    if metrics_mode {
        print!("{}", render_metrics(&pool, &reports));
    } else {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.level.as_str().into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|a| a != flag);
    args.len() != before
}

/// Read the measurement snapshot from `path`, or stdin when absent or "-".
async fn read_snapshot(path: Option<&str>) -> anyhow::Result<Vec<ProxyHistory>> {
    let content = match path {
        Some(p) if p != "-" => tokio::fs::read_to_string(p)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read snapshot '{}': {}", p, e))?,
        _ => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };
    let histories: Vec<ProxyHistory> = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse snapshot: {}", e))?;
    Ok(histories)
}
