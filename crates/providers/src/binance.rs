//! Binance Simple Earn provider.
//!
//! Fetches flexible savings products via the signed
//! `/sapi/v1/simple-earn/flexible/list` endpoint. The endpoint is
//! USER_DATA, so the provider only activates when API credentials are
//! configured.

use crate::error::ProviderError;
use crate::provider::Provider;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use stablewatch_core::RawRate;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Binance Simple Earn flexible products provider.
#[derive(Clone)]
pub struct BinanceEarnProvider {
    api_key: String,
    api_secret: String,
    target_asset: String,
}

impl BinanceEarnProvider {
    const BASE_URL: &'static str = "https://api.binance.com";
    const LIST_PATH: &'static str = "/sapi/v1/simple-earn/flexible/list";
    const EARN_URL: &'static str = "https://www.binance.com/en/simple-earn";

    pub fn new(api_key: String, api_secret: String) -> Self {
        Self {
            api_key,
            api_secret,
            target_asset: "USDC".to_string(),
        }
    }

    fn sign(&self, query: &str) -> String {
        // Key length is unconstrained for HMAC, new_from_slice cannot fail
        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(query.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Extract offers from a flexible product list response.
    ///
    /// Rates come back as fractional strings (`"0.025"` means 2.5% APR);
    /// rows without a parsable rate are skipped.
    pub fn parse_products(&self, body: &Value) -> Result<Vec<RawRate>, ProviderError> {
        let rows = body
            .get("rows")
            .or_else(|| body.get("data"))
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::Payload("no product list in response".to_string()))?;

        let mut out = Vec::new();
        for row in rows {
            let asset = row
                .get("asset")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_uppercase();
            if !asset.contains(&self.target_asset) {
                continue;
            }

            let Some(rate) = row
                .get("latestAnnualPercentageRate")
                .and_then(Self::as_fraction)
            else {
                continue;
            };

            out.push(RawRate {
                platform: Some("Binance Simple Earn".to_string()),
                chain: Some(String::new()),
                symbol: Some(asset),
                apy: Some(rate * 100.0),
                tvl_usd: Some(0.0),
                source_url: Some(Self::EARN_URL.to_string()),
                source: Some(self.name().to_string()),
                notes: Some("flexible".to_string()),
            });
        }

        out.sort_by(|a, b| {
            b.apy
                .partial_cmp(&a.apy)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        debug!(products = out.len(), "Binance: parsed flexible products");
        Ok(out)
    }

    // Binance serializes rates both as strings and as bare numbers.
    fn as_fraction(value: &Value) -> Option<f64> {
        match value {
            Value::String(s) => s.parse().ok(),
            other => other.as_f64(),
        }
    }
}

impl std::fmt::Debug for BinanceEarnProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceEarnProvider")
            .field("target_asset", &self.target_asset)
            .finish()
    }
}

#[async_trait]
impl Provider for BinanceEarnProvider {
    fn key(&self) -> &'static str {
        "binance"
    }

    fn name(&self) -> &'static str {
        "Binance Simple Earn"
    }

    async fn fetch(&self, client: &reqwest::Client) -> Result<Vec<RawRate>, ProviderError> {
        if self.api_key.is_empty() || self.api_secret.is_empty() {
            return Err(ProviderError::MissingCredentials(
                "BINANCE_API_KEY / BINANCE_API_SECRET",
            ));
        }

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let query = format!("size=100&timestamp={timestamp}");
        let url = format!(
            "{}{}?{}&signature={}",
            Self::BASE_URL,
            Self::LIST_PATH,
            query,
            self.sign(&query)
        );

        let response = client
            .get(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }
        let body: Value = response.json().await?;
        self.parse_products(&body)
    }
}
