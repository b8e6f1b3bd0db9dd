//! Reporting and export: JSON and CSV artifacts.
//!
//! - **JSON**: full round-trip serialization of `CalcResult` with schema versioning
//! - **CSV**: the rounded inspection table and the growth curve
//!
//! Rounding happens only here, on copies. Computed values are never altered.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

use crate::runner::{CalcResult, SCHEMA_VERSION};

// ─── Table projection ───────────────────────────────────────────────

/// One display row of the inspection table, rounded to 2 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TableRow {
    pub date: NaiveDate,
    pub close: f64,
    pub dividends: f64,
    pub total_value: f64,
}

/// Round to 2 decimals, ties to even (`0.125` -> `0.12`, `0.375` -> `0.38`).
///
/// Ties are judged on `x * 100.0` as computed in binary.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

/// Rounded `{date, close, dividends, total_value}` rows, one per observation.
pub fn table_rows(result: &CalcResult) -> Vec<TableRow> {
    result
        .observations
        .iter()
        .zip(&result.points)
        .map(|(obs, point)| TableRow {
            date: obs.date,
            close: round2(obs.close),
            dividends: round2(obs.dividend_per_share),
            total_value: round2(point.total_value),
        })
        .collect()
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `CalcResult` to pretty JSON.
pub fn export_json(result: &CalcResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize CalcResult to JSON")
}

/// Deserialize a `CalcResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<CalcResult> {
    let result: CalcResult =
        serde_json::from_str(json).context("failed to deserialize CalcResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export the rounded table with `date,close,dividends,total_value` columns.
pub fn export_table_csv(result: &CalcResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "close", "dividends", "total_value"])?;
    for row in table_rows(result) {
        wtr.write_record([
            &row.date.to_string(),
            &format!("{:.2}", row.close),
            &format!("{:.2}", row.dividends),
            &format!("{:.2}", row.total_value),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the growth curve as CSV with `date,total_value` columns.
pub fn export_curve_csv(result: &CalcResult) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "total_value"])?;
    for p in &result.points {
        wtr.write_record([&p.date.to_string(), &format!("{:.4}", p.total_value)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── File writers ───────────────────────────────────────────────────

pub fn write_json(result: &CalcResult, path: &Path) -> Result<()> {
    let json = export_json(result)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Read a `CalcResult` previously written with `write_json`.
pub fn read_json(path: &Path) -> Result<CalcResult> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

pub fn write_table_csv(result: &CalcResult, path: &Path) -> Result<()> {
    let csv = export_table_csv(result)?;
    std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))
}

pub fn write_curve_csv(result: &CalcResult, path: &Path) -> Result<()> {
    let csv = export_curve_csv(result)?;
    std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))
}
