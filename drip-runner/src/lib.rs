//! drip runner: calculation orchestration, metrics, caching, export.
//!
//! This crate builds on `drip-core` to provide:
//! - Request validation and TOML config files
//! - History loading through a configured provider, with dataset hashing
//! - Single-calculation runner and parallel multi-symbol batches
//! - Extended metrics (CAGR, drawdown, reinvestment accounting)
//! - On-disk result cache keyed by request and dataset hash
//! - JSON and CSV export

pub mod batch;
pub mod cache;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use batch::{rank_entries, BatchEntry, BatchRunner};
pub use cache::{CacheKey, ResultCache};
pub use config::{CalcConfig, CalcRequest, ConfigError, DataConfig, SourceKind};
pub use data_loader::{build_provider, compute_dataset_hash, load_history, LoadedHistory};
pub use export::{table_rows, TableRow};
pub use metrics::ExtendedMetrics;
pub use runner::{
    run_calculation, run_calculation_cached, run_from_history, CalcResult, RunError,
    SCHEMA_VERSION,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn calc_result_is_send_sync() {
        assert_send::<CalcResult>();
        assert_sync::<CalcResult>();
    }

    #[test]
    fn extended_metrics_is_send_sync() {
        assert_send::<ExtendedMetrics>();
        assert_sync::<ExtendedMetrics>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<CalcRequest>();
        assert_sync::<CalcRequest>();
        assert_send::<CalcConfig>();
        assert_sync::<CalcConfig>();
    }

    #[test]
    fn run_error_is_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }

    #[test]
    fn cache_is_send_sync() {
        assert_send::<ResultCache>();
        assert_sync::<ResultCache>();
    }

    #[test]
    fn batch_entry_is_send() {
        assert_send::<BatchEntry>();
    }
}
