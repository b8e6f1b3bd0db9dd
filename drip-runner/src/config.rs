//! Calculation request and TOML configuration.
//!
//! A config file looks like:
//!
//! ```toml
//! [calculation]
//! symbol = "AAPL"
//! initial_investment = 1000.0
//! years_back = 10
//!
//! [data]
//! source = "csv"
//! csv_path = "data/AAPL.csv"
//! ```
//!
//! The `[data]` table is optional and defaults to Yahoo Finance.

use std::path::{Path, PathBuf};

use drip_core::data::{LookbackWindow, PriceBasis};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SYMBOL: &str = "AAPL";
pub const DEFAULT_INITIAL_INVESTMENT: f64 = 1000.0;
pub const DEFAULT_YEARS_BACK: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// The three user inputs of one calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcRequest {
    /// Passed through to the provider uninterpreted.
    pub symbol: String,
    pub initial_investment: f64,
    pub years_back: u32,
}

impl Default for CalcRequest {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            initial_investment: DEFAULT_INITIAL_INVESTMENT,
            years_back: DEFAULT_YEARS_BACK,
        }
    }
}

impl CalcRequest {
    pub fn new(symbol: impl Into<String>, initial_investment: f64, years_back: u32) -> Self {
        Self {
            symbol: symbol.into(),
            initial_investment,
            years_back,
        }
    }

    /// Reject requests that must never reach the provider or the simulator.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::InvalidInput("symbol must not be empty".into()));
        }
        if !(self.initial_investment.is_finite() && self.initial_investment > 0.0) {
            return Err(ConfigError::InvalidInput(format!(
                "initial_investment must be > 0, got {}",
                self.initial_investment
            )));
        }
        if self.years_back < 1 {
            return Err(ConfigError::InvalidInput(format!(
                "years_back must be >= 1, got {}",
                self.years_back
            )));
        }
        Ok(())
    }

    /// The `[end - years_back, end]` window this request covers.
    pub fn window(&self, end: NaiveDate) -> Result<LookbackWindow, ConfigError> {
        LookbackWindow::years_back(end, self.years_back).ok_or_else(|| {
            ConfigError::InvalidInput(format!("years_back {} is out of range", self.years_back))
        })
    }
}

/// Where history comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Yahoo,
    Csv,
    Synthetic,
}

/// Provider selection, the optional `[data]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub source: SourceKind,
    /// File or directory of `<SYMBOL>.csv` files; required for `source = "csv"`.
    pub csv_path: Option<PathBuf>,
    pub price_basis: PriceBasis,
    /// Seed for the synthetic provider.
    pub seed: u64,
}

/// Full config file contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcConfig {
    pub calculation: CalcRequest,
    #[serde(default)]
    pub data: DataConfig,
}

impl CalcConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: CalcConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.calculation.validate()?;
        if self.data.source == SourceKind::Csv && self.data.csv_path.is_none() {
            return Err(ConfigError::InvalidInput(
                "data.csv_path is required when data.source = \"csv\"".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_request_is_valid() {
        let req = CalcRequest::default();
        assert_eq!(req.symbol, "AAPL");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_investment() {
        for amount in [0.0, -100.0, f64::NAN, f64::INFINITY] {
            let req = CalcRequest::new("SPY", amount, 5);
            assert!(
                matches!(req.validate(), Err(ConfigError::InvalidInput(_))),
                "{amount} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_zero_years_and_blank_symbol() {
        assert!(CalcRequest::new("SPY", 1000.0, 0).validate().is_err());
        assert!(CalcRequest::new("  ", 1000.0, 1).validate().is_err());
    }

    #[test]
    fn window_spans_requested_years() {
        let end = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let w = CalcRequest::new("SPY", 1.0, 3).window(end).unwrap();
        assert_eq!(w.start, NaiveDate::from_ymd_opt(2023, 10, 16).unwrap());
        assert_eq!(w.end, end);
    }

    #[test]
    fn parses_config_with_defaults() {
        let config = CalcConfig::from_toml_str(
            r#"
[calculation]
symbol = "KO"
initial_investment = 2500.0
years_back = 20
"#,
        )
        .unwrap();
        assert_eq!(config.calculation, CalcRequest::new("KO", 2500.0, 20));
        assert_eq!(config.data.source, SourceKind::Yahoo);
        assert_eq!(config.data.price_basis, PriceBasis::AdjustedClose);
    }

    #[test]
    fn parses_data_table() {
        let config = CalcConfig::from_toml_str(
            r#"
[calculation]
symbol = "KO"
initial_investment = 100.0
years_back = 1

[data]
source = "synthetic"
seed = 42
price_basis = "close"
"#,
        )
        .unwrap();
        assert_eq!(config.data.source, SourceKind::Synthetic);
        assert_eq!(config.data.seed, 42);
        assert_eq!(config.data.price_basis, PriceBasis::Close);
    }

    #[test]
    fn csv_source_requires_path() {
        let err = CalcConfig::from_toml_str(
            r#"
[calculation]
symbol = "KO"
initial_investment = 100.0
years_back = 1

[data]
source = "csv"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInput(_)));
    }

    #[test]
    fn invalid_values_fail_validation_on_load() {
        let err = CalcConfig::from_toml_str(
            r#"
[calculation]
symbol = "KO"
initial_investment = -1.0
years_back = 1
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInput(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = CalcConfig::from_file(Path::new("/nonexistent/drip.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/drip.toml"));
    }
}
