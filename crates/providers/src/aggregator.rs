//! Aggregation pipeline: fan-out, validate, dedup, rank.

use crate::error::ProviderError;
use crate::provider::ProviderRegistry;
use compact_str::CompactString;
use futures_util::future::join_all;
use stablewatch_core::RateItem;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Upstream APIs must answer within this window or the provider counts
/// as failed for the cycle.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of one provider fetch, kept explicit so partial failure stays
/// visible to callers and tests instead of vanishing into a catch-all.
#[derive(Debug)]
pub struct FetchOutcome {
    /// Registry key of the provider.
    pub key: String,
    /// Raw records, or why the provider yielded nothing this cycle.
    pub result: Result<Vec<stablewatch_core::RawRate>, ProviderError>,
}

/// Orchestrates providers into one validated, deduplicated, ranked list.
///
/// Holds no mutable state; every call owns its own HTTP client and
/// result list, so concurrent invocations are safe.
#[derive(Debug, Clone)]
pub struct Aggregator {
    registry: ProviderRegistry,
    timeout: Duration,
}

impl Aggregator {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            registry,
            timeout: FETCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The provider registry backing this aggregator.
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Fetch, validate, deduplicate and rank offers from the enabled
    /// providers.
    ///
    /// Never fails: unknown keys are skipped, provider errors are logged
    /// and contribute zero items, and an empty result is a valid outcome.
    pub async fn fetch_all(&self, enabled: &[String]) -> Vec<RateItem> {
        collate(self.fetch_outcomes(enabled).await)
    }

    /// Run the fetch fan-out and return per-provider outcomes in the
    /// order of `enabled`.
    pub async fn fetch_outcomes(&self, enabled: &[String]) -> Vec<FetchOutcome> {
        let providers: Vec<_> = enabled
            .iter()
            .filter_map(|key| {
                let provider = self.registry.get(key);
                if provider.is_none() {
                    debug!(key = %key, "Skipping unknown provider key");
                }
                provider.map(|p| (key.clone(), p))
            })
            .collect();

        // Each aggregation pass owns its HTTP client; no state is shared
        // between concurrent invocations.
        let client = match reqwest::Client::builder().timeout(self.timeout).build() {
            Ok(client) => client,
            Err(e) => {
                error!(error = %e, "Failed to build HTTP client, yielding no data this cycle");
                return Vec::new();
            }
        };

        let futures = providers.into_iter().map(|(key, provider)| {
            let client = client.clone();
            async move {
                let result = provider.fetch(&client).await;
                FetchOutcome { key, result }
            }
        });

        join_all(futures).await
    }
}

/// Collate per-provider outcomes into the final ranked list.
///
/// Validation failures drop single records, provider failures drop that
/// provider's batch, duplicates keep the first occurrence, and the sort
/// is stable descending by APY.
pub fn collate(outcomes: Vec<FetchOutcome>) -> Vec<RateItem> {
    let mut items: Vec<RateItem> = Vec::new();

    for outcome in outcomes {
        let raws = match outcome.result {
            Ok(raws) => raws,
            Err(e) => {
                warn!(provider = %outcome.key, error = %e, "Provider failed, continuing without it");
                continue;
            }
        };
        for raw in raws {
            match RateItem::try_from(raw) {
                Ok(item) => items.push(item),
                Err(e) => debug!(provider = %outcome.key, reason = %e, "Dropped invalid record"),
            }
        }
    }

    let mut seen: HashSet<(CompactString, CompactString, String)> = HashSet::new();
    items.retain(|item| {
        seen.insert((
            item.platform.clone(),
            item.chain.clone(),
            item.source_url.clone(),
        ))
    });

    // Stable sort keeps insertion order among equal APYs deterministic
    items.sort_by(|a, b| {
        b.apy
            .partial_cmp(&a.apy)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Provider;
    use async_trait::async_trait;
    use stablewatch_core::RawRate;
    use std::sync::Arc;

    struct StaticProvider {
        key: &'static str,
        rates: Vec<RawRate>,
        fail: bool,
    }

    #[async_trait]
    impl Provider for StaticProvider {
        fn key(&self) -> &'static str {
            self.key
        }

        fn name(&self) -> &'static str {
            self.key
        }

        async fn fetch(&self, _client: &reqwest::Client) -> Result<Vec<RawRate>, ProviderError> {
            if self.fail {
                return Err(ProviderError::Status(500));
            }
            Ok(self.rates.clone())
        }
    }

    fn raw(platform: &str, chain: &str, url: &str, apy: Option<f64>) -> RawRate {
        RawRate {
            platform: Some(platform.to_string()),
            chain: Some(chain.to_string()),
            symbol: Some("USDC".to_string()),
            apy,
            tvl_usd: Some(0.0),
            source_url: Some(url.to_string()),
            source: Some("test".to_string()),
            notes: None,
        }
    }

    fn outcome(key: &str, result: Result<Vec<RawRate>, ProviderError>) -> FetchOutcome {
        FetchOutcome {
            key: key.to_string(),
            result,
        }
    }

    #[test]
    fn test_collate_drops_records_without_apy() {
        let items = collate(vec![outcome(
            "a",
            Ok(vec![
                raw("X", "eth", "http://a", Some(5.0)),
                raw("Y", "eth", "http://b", None),
            ]),
        )]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].platform, "X");
    }

    #[test]
    fn test_collate_dedup_first_seen_wins_across_providers() {
        let items = collate(vec![
            outcome("a", Ok(vec![raw("Aave", "eth", "http://aave/pool1", Some(4.0))])),
            outcome("b", Ok(vec![raw("Aave", "eth", "http://aave/pool1", Some(9.0))])),
        ]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].apy, 4.0);
    }

    #[test]
    fn test_collate_sorts_descending() {
        let items = collate(vec![outcome(
            "a",
            Ok(vec![
                raw("X", "eth", "http://1", Some(2.0)),
                raw("Y", "eth", "http://2", Some(8.0)),
                raw("Z", "eth", "http://3", Some(5.0)),
            ]),
        )]);
        let apys: Vec<_> = items.iter().map(|i| i.apy).collect();
        assert_eq!(apys, vec![8.0, 5.0, 2.0]);
        for pair in items.windows(2) {
            assert!(pair[0].apy >= pair[1].apy);
        }
    }

    #[test]
    fn test_collate_provider_failure_is_partial() {
        let items = collate(vec![
            outcome("a", Err(ProviderError::Status(502))),
            outcome("b", Ok(vec![raw("X", "eth", "http://1", Some(3.0))])),
        ]);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_collate_all_failures_is_empty_not_error() {
        let items = collate(vec![
            outcome("a", Err(ProviderError::Status(500))),
            outcome("b", Err(ProviderError::Payload("bad".to_string()))),
        ]);
        assert!(items.is_empty());
    }

    #[test]
    fn test_collate_discards_out_of_range_apy() {
        let items = collate(vec![outcome(
            "a",
            Ok(vec![
                raw("X", "eth", "http://1", Some(500_000.0)),
                raw("Y", "eth", "http://2", Some(1.0)),
            ]),
        )]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].apy, 1.0);
    }

    fn registry_with(providers: Vec<StaticProvider>) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        for p in providers {
            registry.register(Arc::new(p));
        }
        registry
    }

    #[tokio::test]
    async fn test_fetch_all_skips_unknown_keys() {
        let registry = registry_with(vec![StaticProvider {
            key: "mock",
            rates: vec![raw("X", "eth", "http://1", Some(2.0))],
            fail: false,
        }]);
        let aggregator = Aggregator::new(registry);

        let items = aggregator
            .fetch_all(&["nope".to_string(), "mock".to_string()])
            .await;
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_all_survives_failing_provider() {
        let registry = registry_with(vec![
            StaticProvider {
                key: "down",
                rates: Vec::new(),
                fail: true,
            },
            StaticProvider {
                key: "up",
                rates: vec![raw("X", "eth", "http://1", Some(2.0))],
                fail: false,
            },
        ]);
        let aggregator = Aggregator::new(registry);

        let items = aggregator
            .fetch_all(&["down".to_string(), "up".to_string()])
            .await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].platform, "X");
    }

    #[tokio::test]
    async fn test_fetch_all_empty_when_everything_fails() {
        let registry = registry_with(vec![StaticProvider {
            key: "down",
            rates: Vec::new(),
            fail: true,
        }]);
        let aggregator = Aggregator::new(registry);

        let items = aggregator.fetch_all(&["down".to_string()]).await;
        assert!(items.is_empty());
    }
}
