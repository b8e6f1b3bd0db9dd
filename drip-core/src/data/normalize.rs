//! Time-series adapter: raw provider history → canonical observations.
//!
//! The only checks performed here are structural: the history must be
//! non-empty, every row must carry a finite date/close/dividend triple, and
//! dates must be strictly increasing. Price *values* are not judged; a zero or
//! negative close passes through and is rejected later by the simulator if it
//! ever has to divide by it.

use thiserror::Error;
use tracing::debug;

use super::provider::{RawHistory, RawObservation};
use crate::domain::Observation;

/// Adapter failures. `row` is the zero-based index into the raw rows, or the
/// provider's record number when the row carries one (see
/// `RawObservation::source_row`).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HistoryError {
    #[error("no data returned for '{symbol}'; check the symbol or date range")]
    EmptyHistory { symbol: String },

    #[error("malformed history at row {row}: {reason}")]
    MalformedHistory { row: usize, reason: String },
}

impl HistoryError {
    fn malformed(row: usize, reason: impl Into<String>) -> Self {
        HistoryError::MalformedHistory {
            row,
            reason: reason.into(),
        }
    }
}

/// Normalize a raw history into a non-empty, strictly date-ordered series.
pub fn normalize(raw: &RawHistory) -> Result<Vec<Observation>, HistoryError> {
    if raw.is_empty() {
        return Err(HistoryError::EmptyHistory {
            symbol: raw.symbol.clone(),
        });
    }

    let mut observations: Vec<Observation> = Vec::with_capacity(raw.rows.len());
    for (position, entry) in raw.rows.iter().enumerate() {
        let row = entry.reported_row(position);
        let obs = normalize_row(row, entry)?;
        if let Some(prev) = observations.last() {
            if obs.date <= prev.date {
                return Err(HistoryError::malformed(
                    row,
                    format!(
                        "date {} does not follow {} (dates must be strictly increasing)",
                        obs.date, prev.date
                    ),
                ));
            }
        }
        observations.push(obs);
    }

    debug!(
        symbol = %raw.symbol,
        rows = observations.len(),
        dividend_days = observations.iter().filter(|o| o.pays_dividend()).count(),
        "normalized history"
    );
    Ok(observations)
}

fn normalize_row(row: usize, entry: &RawObservation) -> Result<Observation, HistoryError> {
    let date = entry
        .date
        .ok_or_else(|| HistoryError::malformed(row, "missing date"))?;
    let close = entry
        .close
        .ok_or_else(|| HistoryError::malformed(row, format!("missing close on {date}")))?;
    if !close.is_finite() {
        return Err(HistoryError::malformed(
            row,
            format!("non-numeric close {close} on {date}"),
        ));
    }
    let dividend = entry
        .dividends
        .ok_or_else(|| HistoryError::malformed(row, format!("missing dividend on {date}")))?;
    if !dividend.is_finite() {
        return Err(HistoryError::malformed(
            row,
            format!("non-numeric dividend {dividend} on {date}"),
        ));
    }
    if dividend < 0.0 {
        return Err(HistoryError::malformed(
            row,
            format!("negative dividend {dividend} on {date}"),
        ));
    }
    Ok(Observation::new(date, close, dividend))
}
