//! Normalized yield offer records.
//!
//! Providers emit loosely-typed [`RawRate`] records; validation turns them
//! into [`RateItem`]s or drops them with a [`RateError`].

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest APY percentage accepted as sane.
pub const APY_MIN: f64 = -1000.0;
/// Highest APY percentage accepted as sane.
pub const APY_MAX: f64 = 100_000.0;

/// Validation failures for a single raw record.
#[derive(Debug, Error, PartialEq)]
pub enum RateError {
    #[error("record has no APY")]
    MissingApy,
    #[error("APY {0} outside {APY_MIN}..={APY_MAX}")]
    ApyOutOfRange(f64),
    #[error("record has no source URL")]
    MissingSourceUrl,
    #[error("record has no source name")]
    MissingSource,
}

/// Raw offer record as a provider saw it upstream.
///
/// Every field is optional: upstream schemas drift and nothing here is
/// trusted until validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRate {
    pub platform: Option<String>,
    pub chain: Option<String>,
    pub symbol: Option<String>,
    pub apy: Option<f64>,
    pub tvl_usd: Option<f64>,
    pub source_url: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

/// One validated yield offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateItem {
    /// Offering entity (protocol or exchange), never empty.
    pub platform: CompactString,
    /// Network identifier, may be empty for CEX offers.
    pub chain: CompactString,
    /// Uppercase asset ticker(s), e.g. "USDC" or "USDC-WETH".
    pub symbol: CompactString,
    /// Annual percentage yield, percent.
    pub apy: f64,
    /// Total value locked in USD, 0 when unknown.
    pub tvl_usd: f64,
    /// Deep link to the offer.
    pub source_url: String,
    /// Provider display name.
    pub source: CompactString,
    /// Optional free text.
    pub notes: String,
}

impl RateItem {
    /// Deduplication key: offers with the same platform, chain and URL
    /// describe the same pool regardless of which provider returned them.
    pub fn dedup_key(&self) -> (&str, &str, &str) {
        (&self.platform, &self.chain, &self.source_url)
    }
}

impl TryFrom<RawRate> for RateItem {
    type Error = RateError;

    fn try_from(raw: RawRate) -> Result<Self, Self::Error> {
        let apy = raw.apy.ok_or(RateError::MissingApy)?;
        if !(APY_MIN..=APY_MAX).contains(&apy) || apy.is_nan() {
            return Err(RateError::ApyOutOfRange(apy));
        }

        let source_url = raw
            .source_url
            .filter(|u| !u.is_empty())
            .ok_or(RateError::MissingSourceUrl)?;
        let source = raw
            .source
            .filter(|s| !s.is_empty())
            .ok_or(RateError::MissingSource)?;

        let platform = match raw.platform {
            Some(p) if !p.is_empty() => CompactString::new(p),
            _ => CompactString::const_new("unknown"),
        };

        Ok(Self {
            platform,
            chain: CompactString::new(raw.chain.unwrap_or_default()),
            symbol: CompactString::new(raw.symbol.unwrap_or_default().to_uppercase()),
            apy,
            tvl_usd: raw.tvl_usd.unwrap_or(0.0),
            source_url,
            source: CompactString::new(source),
            notes: raw.notes.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(apy: Option<f64>) -> RawRate {
        RawRate {
            platform: Some("Aave".to_string()),
            chain: Some("eth".to_string()),
            symbol: Some("usdc".to_string()),
            apy,
            tvl_usd: Some(1_000_000.0),
            source_url: Some("https://defillama.com/yields/pool/abc".to_string()),
            source: Some("DefiLlama".to_string()),
            notes: None,
        }
    }

    #[test]
    fn test_valid_record() {
        let item = RateItem::try_from(raw(Some(4.2))).unwrap();
        assert_eq!(item.platform, "Aave");
        assert_eq!(item.apy, 4.2);
        assert_eq!(item.tvl_usd, 1_000_000.0);
        assert_eq!(item.notes, "");
    }

    #[test]
    fn test_symbol_uppercased() {
        let item = RateItem::try_from(raw(Some(4.2))).unwrap();
        assert_eq!(item.symbol, "USDC");
    }

    #[test]
    fn test_missing_apy_rejected() {
        assert_eq!(RateItem::try_from(raw(None)), Err(RateError::MissingApy));
    }

    #[test]
    fn test_out_of_range_apy_rejected() {
        assert_eq!(
            RateItem::try_from(raw(Some(200_000.0))),
            Err(RateError::ApyOutOfRange(200_000.0))
        );
        assert_eq!(
            RateItem::try_from(raw(Some(-2000.0))),
            Err(RateError::ApyOutOfRange(-2000.0))
        );
        // Boundaries are inclusive
        assert!(RateItem::try_from(raw(Some(APY_MAX))).is_ok());
        assert!(RateItem::try_from(raw(Some(APY_MIN))).is_ok());
    }

    #[test]
    fn test_missing_source_url_rejected() {
        let mut r = raw(Some(4.2));
        r.source_url = None;
        assert_eq!(RateItem::try_from(r), Err(RateError::MissingSourceUrl));

        let mut r = raw(Some(4.2));
        r.source_url = Some(String::new());
        assert_eq!(RateItem::try_from(r), Err(RateError::MissingSourceUrl));
    }

    #[test]
    fn test_platform_falls_back_to_unknown() {
        let mut r = raw(Some(4.2));
        r.platform = None;
        let item = RateItem::try_from(r).unwrap();
        assert_eq!(item.platform, "unknown");
    }

    #[test]
    fn test_missing_tvl_defaults_to_zero() {
        let mut r = raw(Some(4.2));
        r.tvl_usd = None;
        let item = RateItem::try_from(r).unwrap();
        assert_eq!(item.tvl_usd, 0.0);
    }

    #[test]
    fn test_dedup_key() {
        let item = RateItem::try_from(raw(Some(4.2))).unwrap();
        assert_eq!(
            item.dedup_key(),
            ("Aave", "eth", "https://defillama.com/yields/pool/abc")
        );
    }
}
