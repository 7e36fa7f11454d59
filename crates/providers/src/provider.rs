//! Provider trait and registry.
//!
//! Each external yield source implements [`Provider`]; the registry maps
//! configuration keys to instances so new adapters plug in without
//! touching the aggregator.

use crate::error::ProviderError;
use crate::{BinanceEarnProvider, DefiLlamaProvider};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use stablewatch_core::RawRate;

/// A single external yield data source.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Registry key used in configuration (e.g. "defillama").
    fn key(&self) -> &'static str;

    /// Display name stamped into each record's `source` field.
    fn name(&self) -> &'static str;

    /// Fetch raw offers from the upstream API.
    ///
    /// Implementations filter to the target stablecoin, uppercase the
    /// symbol, drop records without an APY and default missing TVL to 0.
    async fn fetch(&self, client: &reqwest::Client) -> Result<Vec<RawRate>, ProviderError>;
}

/// Name-keyed set of available providers.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<&'static str, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the stock providers: DefiLlama always, Binance only
    /// when API credentials are supplied.
    pub fn standard(binance_credentials: Option<(String, String)>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DefiLlamaProvider::default()));
        if let Some((key, secret)) = binance_credentials {
            registry.register(Arc::new(BinanceEarnProvider::new(key, secret)));
        }
        registry
    }

    /// Register a provider under its own key, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        self.providers.insert(provider.key(), provider);
    }

    /// Look up a provider by configuration key.
    pub fn get(&self, key: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(key).cloned()
    }

    /// Registered keys, sorted for stable display.
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<_> = self.providers.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_without_credentials() {
        let registry = ProviderRegistry::standard(None);
        assert!(registry.get("defillama").is_some());
        assert!(registry.get("binance").is_none());
        assert_eq!(registry.keys(), vec!["defillama"]);
    }

    #[test]
    fn test_standard_registry_with_credentials() {
        let registry =
            ProviderRegistry::standard(Some(("key".to_string(), "secret".to_string())));
        assert_eq!(registry.keys(), vec!["binance", "defillama"]);
    }

    #[test]
    fn test_unknown_key_is_none() {
        let registry = ProviderRegistry::standard(None);
        assert!(registry.get("okx").is_none());
    }
}
