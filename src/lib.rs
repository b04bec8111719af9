pub mod config;
pub mod exporter;
pub mod pool;
pub mod proxy;
pub mod report;
pub mod scoring;

pub use config::Config;
pub use pool::ProxyPool;
pub use proxy::{OutcomeSample, ProxyHistory, ProxyMetrics, ProxyStatus};
pub use report::ScoreReport;
pub use scoring::composite::{CompositeScorer, ProxyScore};
pub use scoring::{Degradation, Estimate};
