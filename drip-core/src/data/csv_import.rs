//! CSV import provider.
//!
//! Reads `date,close,dividends` files, the shape a yfinance-style history
//! export has after dropping the other columns. Header names are matched
//! case-insensitively; `dividends` may be omitted and defaults to zero.
//! Dates may carry a time suffix (`2024-05-13 00:00:00-04:00`); only the
//! leading `YYYY-MM-DD` is read.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::debug;

use super::normalize::HistoryError;
use super::provider::{
    DataError, DataProvider, DataSource, LookbackWindow, RawHistory, RawObservation,
};

const DATE_HEADERS: &[&str] = &["date", "datetime"];
const CLOSE_HEADERS: &[&str] = &["close"];
const DIVIDEND_HEADERS: &[&str] = &["dividends", "dividend", "dividend_per_share"];

/// History from local CSV files.
///
/// `path` is either a single file (served for every symbol) or a directory
/// holding one `<SYMBOL>.csv` per symbol.
pub struct CsvProvider {
    path: PathBuf,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn file_for(&self, symbol: &str) -> PathBuf {
        if self.path.is_dir() {
            self.path.join(format!("{symbol}.csv"))
        } else {
            self.path.clone()
        }
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn fetch(&self, symbol: &str, window: LookbackWindow) -> Result<RawHistory, DataError> {
        let file = self.file_for(symbol);
        if !file.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let rows = read_csv_file(&file, Some(window))?;
        debug!(symbol, path = %file.display(), rows = rows.len(), "loaded CSV history");
        Ok(RawHistory::new(symbol, rows, DataSource::CsvImport))
    }

    fn is_available(&self) -> bool {
        self.path.exists()
    }
}

pub fn read_csv_file(
    path: &Path,
    window: Option<LookbackWindow>,
) -> Result<Vec<RawObservation>, DataError> {
    let file = std::fs::File::open(path)?;
    parse_csv(file, window)
}

/// Parse CSV history. Rows whose date falls outside `window` are skipped;
/// rows without a date are kept so the adapter can report them.
pub fn parse_csv<R: Read>(
    reader: R,
    window: Option<LookbackWindow>,
) -> Result<Vec<RawObservation>, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| malformed(0, format!("unreadable header: {e}")))?
        .clone();
    let find = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
    };
    let date_col = find(DATE_HEADERS).ok_or_else(|| malformed(0, "missing 'date' column"))?;
    let close_col = find(CLOSE_HEADERS).ok_or_else(|| malformed(0, "missing 'close' column"))?;
    let dividend_col = find(DIVIDEND_HEADERS);

    let mut rows = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| malformed(row, e.to_string()))?;
        let cell = |col: usize| record.get(col).filter(|s| !s.is_empty());

        let date = cell(date_col)
            .map(|s| {
                parse_date(s).ok_or_else(|| malformed(row, format!("unparseable date '{s}'")))
            })
            .transpose()?;
        if let (Some(d), Some(w)) = (date, window) {
            if !w.contains(d) {
                continue;
            }
        }
        let close = cell(close_col)
            .map(|s| {
                parse_number(s).ok_or_else(|| malformed(row, format!("non-numeric close '{s}'")))
            })
            .transpose()?;
        let dividends = match dividend_col.and_then(cell) {
            Some(s) => Some(
                parse_number(s)
                    .ok_or_else(|| malformed(row, format!("non-numeric dividend '{s}'")))?,
            ),
            None => Some(0.0),
        };

        rows.push(RawObservation {
            date,
            close,
            dividends,
            source_row: Some(row),
        });
    }
    Ok(rows)
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let head = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn malformed(row: usize, reason: impl Into<String>) -> DataError {
    DataError::History(HistoryError::MalformedHistory {
        row,
        reason: reason.into(),
    })
}
