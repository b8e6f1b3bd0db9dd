//! History loading for the runner.
//!
//! Builds the configured provider, fetches the request's look-back window and
//! runs the adapter. The result carries a BLAKE3 hash of the normalized data
//! so identical snapshots can be recognised by the result cache.

use std::sync::Arc;

use chrono::NaiveDate;
use drip_core::data::{
    normalize, CircuitBreaker, CsvProvider, DataError, DataProvider, DataSource, LookbackWindow,
    SyntheticProvider, YahooProvider,
};
use drip_core::Observation;
use tracing::info;

use crate::config::{CalcRequest, ConfigError, DataConfig, SourceKind};
use crate::runner::RunError;

/// Normalized history for one request, with provenance.
#[derive(Debug, Clone)]
pub struct LoadedHistory {
    pub symbol: String,
    pub window: LookbackWindow,
    pub observations: Vec<Observation>,
    pub source: DataSource,
    pub dataset_hash: String,
}

/// Construct the provider named by `config`.
pub fn build_provider(config: &DataConfig) -> Result<Box<dyn DataProvider>, RunError> {
    let provider: Box<dyn DataProvider> = match config.source {
        SourceKind::Yahoo => {
            let breaker = Arc::new(CircuitBreaker::default_provider());
            Box::new(YahooProvider::new(breaker)?.with_price_basis(config.price_basis))
        }
        SourceKind::Csv => {
            let path = config.csv_path.as_ref().ok_or_else(|| {
                ConfigError::InvalidInput("a CSV path is required for the csv source".into())
            })?;
            Box::new(CsvProvider::new(path))
        }
        SourceKind::Synthetic => Box::new(SyntheticProvider::new(config.seed)),
    };
    Ok(provider)
}

/// Fetch and normalize the history a request needs, ending at `end`.
pub fn load_history(
    provider: &dyn DataProvider,
    request: &CalcRequest,
    end: NaiveDate,
) -> Result<LoadedHistory, RunError> {
    request.validate()?;
    let window = request.window(end)?;

    if !provider.is_available() {
        return Err(RunError::ProviderUnavailable(provider.name().to_string()));
    }

    let raw = provider.fetch(&request.symbol, window).map_err(|e| match e {
        DataError::History(h) => RunError::History(h),
        other => RunError::Data(other),
    })?;
    let observations = normalize(&raw)?;
    let dataset_hash = compute_dataset_hash(&request.symbol, &observations);

    info!(
        symbol = %request.symbol,
        provider = provider.name(),
        start = %window.start,
        end = %window.end,
        days = observations.len(),
        "loaded history"
    );

    Ok(LoadedHistory {
        symbol: request.symbol.clone(),
        window,
        observations,
        source: raw.source,
        dataset_hash,
    })
}

/// Deterministic BLAKE3 hash over the symbol and every observation.
pub fn compute_dataset_hash(symbol: &str, observations: &[Observation]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    for obs in observations {
        hasher.update(obs.date.to_string().as_bytes());
        hasher.update(&obs.close.to_le_bytes());
        hasher.update(&obs.dividend_per_share.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
