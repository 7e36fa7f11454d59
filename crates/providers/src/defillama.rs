//! DefiLlama yields API provider.
//!
//! Pulls the public pool list from <https://yields.llama.fi/pools> and
//! filters to pools whose symbol contains the target stablecoin. The
//! upstream schema is unversioned, so parsing treats every field as
//! optional and accepts the known alternate key spellings.

use crate::error::ProviderError;
use crate::provider::Provider;
use async_trait::async_trait;
use serde_json::Value;
use stablewatch_core::RawRate;
use tracing::debug;

/// DefiLlama DeFi yields provider.
#[derive(Debug, Clone)]
pub struct DefiLlamaProvider {
    target_symbol: String,
}

impl Default for DefiLlamaProvider {
    fn default() -> Self {
        Self::new("USDC")
    }
}

impl DefiLlamaProvider {
    const BASE_URL: &'static str = "https://yields.llama.fi/pools";
    const POOL_URL: &'static str = "https://defillama.com/yields/pool";
    const FALLBACK_URL: &'static str = "https://defillama.com/yields";

    /// Provider filtering pools to symbols containing `target_symbol`.
    pub fn new(target_symbol: &str) -> Self {
        Self {
            target_symbol: target_symbol.to_uppercase(),
        }
    }

    /// Extract offers from a pools response body.
    ///
    /// The result list has been observed under both `data` and `pools`;
    /// TVL under both `tvlUsd` and `tvl`. Pools without an APY figure
    /// are skipped here rather than handed downstream.
    pub fn parse_pools(&self, body: &Value) -> Result<Vec<RawRate>, ProviderError> {
        let pools = body
            .get("data")
            .or_else(|| body.get("pools"))
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::Payload("no pool list in response".to_string()))?;

        let mut out = Vec::new();
        for pool in pools {
            let symbol = pool
                .get("symbol")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_uppercase();
            if !symbol.contains(&self.target_symbol) {
                continue;
            }

            let Some(apy) = pool.get("apy").and_then(Value::as_f64) else {
                continue;
            };

            let tvl_usd = pool
                .get("tvlUsd")
                .or_else(|| pool.get("tvl"))
                .and_then(Value::as_f64)
                .unwrap_or(0.0);

            let source_url = match pool.get("pool").and_then(Value::as_str) {
                Some(id) => format!("{}/{}", Self::POOL_URL, id),
                None => Self::FALLBACK_URL.to_string(),
            };

            out.push(RawRate {
                platform: pool
                    .get("project")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                chain: pool.get("chain").and_then(Value::as_str).map(str::to_string),
                symbol: Some(symbol),
                apy: Some(apy),
                tvl_usd: Some(tvl_usd),
                source_url: Some(source_url),
                source: Some(self.name().to_string()),
                notes: None,
            });
        }

        // Provider-local ranking; the aggregator re-sorts the merged set
        out.sort_by(|a, b| {
            b.apy
                .partial_cmp(&a.apy)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        debug!(pools = out.len(), target = %self.target_symbol, "DefiLlama: parsed pools");
        Ok(out)
    }
}

#[async_trait]
impl Provider for DefiLlamaProvider {
    fn key(&self) -> &'static str {
        "defillama"
    }

    fn name(&self) -> &'static str {
        "DefiLlama"
    }

    async fn fetch(&self, client: &reqwest::Client) -> Result<Vec<RawRate>, ProviderError> {
        let response = client.get(Self::BASE_URL).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }
        let body: Value = response.json().await?;
        self.parse_pools(&body)
    }
}
