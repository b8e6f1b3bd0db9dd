//! History providers and the time-series adapter

pub mod circuit_breaker;
pub mod csv_import;
pub mod normalize;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use csv_import::CsvProvider;
pub use normalize::{normalize, HistoryError};
pub use provider::{DataError, DataProvider, DataSource, LookbackWindow, RawHistory, RawObservation};
pub use synthetic::SyntheticProvider;
pub use yahoo::{PriceBasis, YahooProvider};
