//! Multi-symbol comparison runs.
//!
//! Each symbol is an independent calculation, so the batch fans out with
//! Rayon. One symbol failing never aborts the others; its error is kept in
//! the entry and reported alongside the successes.

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{info, warn};

use drip_core::DataProvider;

use crate::cache::ResultCache;
use crate::config::CalcRequest;
use crate::runner::{run_calculation, run_calculation_cached, CalcResult, RunError};

/// Outcome for one symbol of a batch.
#[derive(Debug)]
pub struct BatchEntry {
    pub symbol: String,
    pub outcome: Result<CalcResult, RunError>,
}

impl BatchEntry {
    pub fn percent_return(&self) -> Option<f64> {
        self.outcome.as_ref().ok().map(|r| r.summary.percent_return)
    }
}

/// Batch executor over a shared provider.
pub struct BatchRunner<'a> {
    provider: &'a dyn DataProvider,
    cache: Option<&'a ResultCache>,
    parallel: bool,
}

impl<'a> BatchRunner<'a> {
    pub fn new(provider: &'a dyn DataProvider) -> Self {
        Self {
            provider,
            cache: None,
            parallel: true,
        }
    }

    pub fn with_cache(mut self, cache: &'a ResultCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run the same investment and horizon for every symbol.
    ///
    /// Entries come back best percent return first; failures sort last in
    /// input order.
    pub fn run(
        &self,
        symbols: &[String],
        initial_investment: f64,
        years_back: u32,
        end: NaiveDate,
    ) -> Vec<BatchEntry> {
        let run_one = |symbol: &String| {
            let request = CalcRequest::new(symbol.clone(), initial_investment, years_back);
            let outcome = match self.cache {
                Some(cache) => run_calculation_cached(&request, self.provider, end, cache),
                None => run_calculation(&request, self.provider, end),
            };
            if let Err(e) = &outcome {
                warn!(symbol = %symbol, error = %e, "batch calculation failed");
            }
            BatchEntry {
                symbol: symbol.clone(),
                outcome,
            }
        };

        let mut entries: Vec<BatchEntry> = if self.parallel {
            symbols.par_iter().map(run_one).collect()
        } else {
            symbols.iter().map(run_one).collect()
        };

        rank_entries(&mut entries);
        let failed = entries.iter().filter(|e| e.outcome.is_err()).count();
        info!(symbols = entries.len(), failed, "batch complete");
        entries
    }
}

/// Stable sort: descending percent return, errors after all successes.
pub fn rank_entries(entries: &mut [BatchEntry]) {
    entries.sort_by(|a, b| match (a.percent_return(), b.percent_return()) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
