use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Currency display info derived from the caller's country. Display-only:
/// billing amounts are unaffected by this lookup.
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoCurrency {
    pub country_code: String,
    pub is_india: bool,
    pub currency: String,
    pub currency_symbol: String,
    pub conversion_rate: f64,
}

/// External IP-to-country lookup.
#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// ISO 3166-1 alpha-2 country code for the address.
    async fn locate(&self, ip: &str) -> anyhow::Result<String>;
}

/// Service trait mapping a caller address to currency display info.
#[async_trait]
pub trait GeoService: Send + Sync {
    /// Never fails: lookup errors fall back to USD defaults.
    async fn currency_for_ip(&self, ip: &str) -> GeoCurrency;
}
