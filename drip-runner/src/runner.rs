//! Calculation runner: wires together loading, simulation, and metrics.
//!
//! Two entry points:
//! - `run_calculation()`: loads history through a provider, then runs. Used by CLI.
//! - `run_from_history()`: takes pre-loaded history. No I/O.
//!
//! `run_calculation_cached()` wraps the first with the on-disk result cache.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use drip_core::data::{DataError, DataProvider, DataSource, HistoryError};
use drip_core::{simulate, Observation, PortfolioPoint, SimulationError, SummaryMetrics};

use crate::cache::{CacheKey, ResultCache};
use crate::config::{CalcRequest, ConfigError};
use crate::data_loader::{load_history, LoadedHistory};
use crate::metrics::ExtendedMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("{0}")]
    History(#[from] HistoryError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
    #[error("provider '{0}' is unavailable")]
    ProviderUnavailable(String),
}

impl RunError {
    /// True when the failure means "the provider had nothing for this request".
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            RunError::History(HistoryError::EmptyHistory { .. })
                | RunError::Simulation(SimulationError::EmptyHistory)
                | RunError::Data(DataError::SymbolNotFound { .. })
        )
    }
}

/// Current schema version for persisted results.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of one calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub initial_investment: f64,
    pub years_back: u32,
    /// Requested window, not the first/last trading day.
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub source: DataSource,
    pub dataset_hash: String,
    pub observations: Vec<Observation>,
    pub points: Vec<PortfolioPoint>,
    pub summary: SummaryMetrics,
    pub extended: ExtendedMetrics,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl CalcResult {
    pub fn is_synthetic(&self) -> bool {
        self.source.is_synthetic()
    }

    pub fn first_trading_day(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.date)
    }

    pub fn last_trading_day(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(
            &self.symbol,
            self.initial_investment,
            self.years_back,
            &self.dataset_hash,
        )
    }
}

/// Load history for `request` ending at `end`, then simulate.
pub fn run_calculation(
    request: &CalcRequest,
    provider: &dyn DataProvider,
    end: NaiveDate,
) -> Result<CalcResult, RunError> {
    let history = load_history(provider, request, end)?;
    run_from_history(request, history)
}

/// Same as `run_calculation`, but reuses a cached result for an identical
/// request over an identical dataset. Cache failures only log.
///
/// The key ignores the window, so a hit is re-stamped with this request's
/// `start_date` / `end_date`.
pub fn run_calculation_cached(
    request: &CalcRequest,
    provider: &dyn DataProvider,
    end: NaiveDate,
    cache: &ResultCache,
) -> Result<CalcResult, RunError> {
    let history = load_history(provider, request, end)?;
    let key = CacheKey::new(
        &request.symbol,
        request.initial_investment,
        request.years_back,
        &history.dataset_hash,
    );

    match cache.get(&key) {
        Ok(Some(mut hit)) => {
            debug!(symbol = %request.symbol, key = %key, "result cache hit");
            hit.start_date = history.window.start;
            hit.end_date = history.window.end;
            return Ok(hit);
        }
        Ok(None) => {}
        Err(e) => warn!(key = %key, error = %e, "ignoring unreadable cache entry"),
    }

    let result = run_from_history(request, history)?;
    if let Err(e) = cache.put(&result) {
        warn!(key = %key, error = %e, "failed to write result cache");
    }
    Ok(result)
}

/// Run the simulator over already-normalized history. No I/O.
pub fn run_from_history(
    request: &CalcRequest,
    history: LoadedHistory,
) -> Result<CalcResult, RunError> {
    request.validate()?;
    let sim = simulate(&history.observations, request.initial_investment)?;
    let extended = ExtendedMetrics::compute(&history.observations, &sim);

    info!(
        symbol = %history.symbol,
        final_value = sim.summary.final_value,
        percent_return = sim.summary.percent_return,
        reinvestments = extended.reinvestment_count,
        "calculation complete"
    );

    Ok(CalcResult {
        schema_version: SCHEMA_VERSION,
        symbol: history.symbol,
        initial_investment: request.initial_investment,
        years_back: request.years_back,
        start_date: history.window.start,
        end_date: history.window.end,
        source: history.source,
        dataset_hash: history.dataset_hash,
        observations: history.observations,
        points: sim.points,
        summary: sim.summary,
        extended,
    })
}
