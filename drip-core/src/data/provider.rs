//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over history sources (Yahoo Finance, CSV
//! import, synthetic) so the runner can swap implementations and tests can
//! inject fixed series.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::normalize::HistoryError;

/// One raw row of provider history, before validation.
///
/// Every field is optional so that gaps in the provider response survive
/// until the adapter can report them with a row number. Providers fill
/// `dividends` with `Some(0.0)` on days without a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub date: Option<NaiveDate>,
    pub close: Option<f64>,
    pub dividends: Option<f64>,
    /// Zero-based record number in the provider's own input, when the
    /// provider drops rows before the adapter sees them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_row: Option<usize>,
}

impl RawObservation {
    pub fn new(date: NaiveDate, close: f64, dividends: f64) -> Self {
        Self {
            date: Some(date),
            close: Some(close),
            dividends: Some(dividends),
            source_row: None,
        }
    }

    pub fn with_source_row(mut self, row: usize) -> Self {
        self.source_row = Some(row);
        self
    }

    /// Row number to report for this observation, given its position in
    /// the history handed to the adapter.
    pub fn reported_row(&self, position: usize) -> usize {
        self.source_row.unwrap_or(position)
    }
}

/// Raw price + dividend history for one symbol, as returned by a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawHistory {
    pub symbol: String,
    pub rows: Vec<RawObservation>,
    pub source: DataSource,
}

impl RawHistory {
    pub fn new(symbol: impl Into<String>, rows: Vec<RawObservation>, source: DataSource) -> Self {
        Self {
            symbol: symbol.into(),
            rows,
            source,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Structured error types for data operations.
///
/// These are designed to be displayable directly by the CLI.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("{0}")]
    History(#[from] HistoryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("data error: {0}")]
    Other(String),
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Synthetic,
}

impl DataSource {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, DataSource::Synthetic)
    }
}

/// Inclusive calendar date range ending at `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookbackWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl LookbackWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DataError> {
        if start > end {
            return Err(DataError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window covering `years` calendar years back from `end`.
    ///
    /// Feb 29 maps to Feb 28 when the start year is not a leap year.
    /// Returns `None` if the start date would fall before chrono's minimum date.
    pub fn years_back(end: NaiveDate, years: u32) -> Option<Self> {
        let start = end.checked_sub_months(Months::new(years.checked_mul(12)?))?;
        Some(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Trait for history providers (Yahoo Finance, CSV import, etc).
///
/// Implementations handle the specifics of fetching data from a particular
/// source. Returning an empty `RawHistory` is valid: the adapter turns it
/// into `HistoryError::EmptyHistory`.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily closes and dividends for a symbol over a date range.
    fn fetch(&self, symbol: &str, window: LookbackWindow) -> Result<RawHistory, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool;
}
