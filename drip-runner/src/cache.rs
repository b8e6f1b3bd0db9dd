//! Result caching with JSON storage and hash-based deduplication.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::runner::{CalcResult, SCHEMA_VERSION};

/// Content hash of (symbol, initial investment, years back, dataset hash).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(symbol: &str, initial_investment: f64, years_back: u32, dataset_hash: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(symbol.as_bytes());
        hasher.update(&initial_investment.to_le_bytes());
        hasher.update(&years_back.to_le_bytes());
        hasher.update(dataset_hash.as_bytes());
        Self(hasher.finalize().to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cache for calculation results.
///
/// One pretty-printed JSON file per `CacheKey`. Because the key includes the
/// dataset hash, a provider returning revised history never hits a stale entry.
#[derive(Clone)]
pub struct ResultCache {
    cache_dir: PathBuf,
}

impl ResultCache {
    /// Creates a new cache with the specified directory.
    ///
    /// The directory will be created if it doesn't exist.
    pub fn new(cache_dir: impl AsRef<Path>) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&cache_dir).with_context(|| {
            format!("Failed to create cache directory {}", cache_dir.display())
        })?;

        Ok(Self { cache_dir })
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.result_path(key).exists()
    }

    /// Retrieves a cached result.
    ///
    /// Entries written by a newer schema are treated as misses.
    pub fn get(&self, key: &CacheKey) -> Result<Option<CalcResult>> {
        let path = self.result_path(key);

        if !path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&path).context("Failed to read cached result")?;
        let result: CalcResult =
            serde_json::from_str(&json).context("Failed to deserialize cached result")?;

        if result.schema_version > SCHEMA_VERSION {
            return Ok(None);
        }
        Ok(Some(result))
    }

    pub fn put(&self, result: &CalcResult) -> Result<()> {
        let path = self.result_path(&result.cache_key());
        let json = serde_json::to_string_pretty(result).context("Failed to serialize result")?;
        std::fs::write(&path, json).context("Failed to write cached result")?;
        Ok(())
    }

    pub fn remove(&self, key: &CacheKey) -> Result<()> {
        let path = self.result_path(key);

        if path.exists() {
            std::fs::remove_file(&path).context("Failed to remove cached result")?;
        }

        Ok(())
    }

    /// Clears all cached results.
    pub fn clear(&self) -> Result<()> {
        for path in self.entries()? {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.entries()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn entries(&self) -> Result<Vec<PathBuf>> {
        let paths = std::fs::read_dir(&self.cache_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json")
            })
            .collect();
        Ok(paths)
    }

    fn result_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{key}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ExtendedMetrics;
    use chrono::NaiveDate;
    use drip_core::data::DataSource;
    use drip_core::{Observation, PortfolioPoint, SummaryMetrics};

    fn create_test_result(symbol: &str) -> CalcResult {
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        CalcResult {
            schema_version: SCHEMA_VERSION,
            symbol: symbol.to_string(),
            initial_investment: 1000.0,
            years_back: 1,
            start_date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
            end_date: d,
            source: DataSource::Synthetic,
            dataset_hash: "abc".into(),
            observations: vec![Observation::new(d, 100.0, 0.0)],
            points: vec![PortfolioPoint {
                date: d,
                total_value: 1000.0,
                shares_held: 10.0,
                reinvested_shares: 0.0,
            }],
            summary: SummaryMetrics::from_final_value(1000.0, 1000.0),
            extended: ExtendedMetrics {
                cagr: 0.0,
                max_drawdown: 0.0,
                reinvestment_count: 0,
                dividend_cash_reinvested: 0.0,
                final_shares: 10.0,
                price_only_final_value: 1000.0,
                price_only_percent_return: 0.0,
            },
        }
    }

    #[test]
    fn test_cache_put_get() {
        let temp_dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::new(temp_dir.path()).unwrap();
        let result = create_test_result("SPY");
        let key = result.cache_key();

        assert!(!cache.contains(&key));
        assert!(cache.get(&key).unwrap().is_none());

        cache.put(&result).unwrap();
        assert!(cache.contains(&key));
        assert_eq!(cache.get(&key).unwrap(), Some(result));
    }

    #[test]
    fn test_cache_remove_and_clear() {
        let temp_dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::new(temp_dir.path()).unwrap();
        let a = create_test_result("A");
        let b = create_test_result("B");
        cache.put(&a).unwrap();
        cache.put(&b).unwrap();
        assert_eq!(cache.len().unwrap(), 2);

        cache.remove(&a.cache_key()).unwrap();
        assert_eq!(cache.len().unwrap(), 1);

        cache.clear().unwrap();
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn key_depends_on_every_input() {
        let base = CacheKey::new("SPY", 1000.0, 10, "h");
        assert_eq!(base, CacheKey::new("SPY", 1000.0, 10, "h"));
        assert_ne!(base, CacheKey::new("QQQ", 1000.0, 10, "h"));
        assert_ne!(base, CacheKey::new("SPY", 1001.0, 10, "h"));
        assert_ne!(base, CacheKey::new("SPY", 1000.0, 11, "h"));
        assert_ne!(base, CacheKey::new("SPY", 1000.0, 10, "g"));
        assert_eq!(base.as_str().len(), 64);
    }

    #[test]
    fn newer_schema_entry_is_a_miss() {
        let temp_dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::new(temp_dir.path()).unwrap();
        let mut result = create_test_result("SPY");
        result.schema_version = SCHEMA_VERSION + 1;
        cache.put(&result).unwrap();
        assert!(cache.get(&result.cache_key()).unwrap().is_none());
    }
}
