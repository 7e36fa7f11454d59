//! Yield data providers and the aggregation pipeline.
//!
//! Each provider pulls raw offers from one external REST API and
//! normalizes them into `RawRate` records. The [`Aggregator`] fans out
//! across enabled providers, validates, deduplicates and ranks.

pub mod aggregator;
pub mod binance;
pub mod defillama;
pub mod error;
pub mod provider;

pub use aggregator::{collate, Aggregator, FetchOutcome, FETCH_TIMEOUT};
pub use binance::BinanceEarnProvider;
pub use defillama::DefiLlamaProvider;
pub use error::ProviderError;
pub use provider::{Provider, ProviderRegistry};
