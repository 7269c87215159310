use super::ports::{GeoCurrency, GeoLocator, GeoService};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// ip-api style lookup: `GET {base}/json/{ip}?fields=status,countryCode`.
pub struct HttpGeoLocator {
    base_url: String,
    http_client: reqwest::Client,
}

#[derive(serde::Deserialize)]
struct LookupResponse {
    status: String,
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
}

impl HttpGeoLocator {
    pub fn new(base_url: String, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl GeoLocator for HttpGeoLocator {
    async fn locate(&self, ip: &str) -> anyhow::Result<String> {
        let url = format!("{}/json/{}?fields=status,countryCode", self.base_url, ip);

        let response = self.http_client.get(&url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("geo lookup failed with status {}", response.status());
        }

        let body: LookupResponse = response.json().await?;
        if body.status != "success" {
            anyhow::bail!("geo lookup returned status {}", body.status);
        }

        body.country_code
            .ok_or_else(|| anyhow::anyhow!("geo lookup response missing countryCode"))
    }
}

pub struct GeoServiceImpl {
    locator: Arc<dyn GeoLocator>,
    inr_conversion_rate: f64,
}

impl GeoServiceImpl {
    pub fn new(locator: Arc<dyn GeoLocator>, inr_conversion_rate: f64) -> Self {
        Self {
            locator,
            inr_conversion_rate,
        }
    }

    fn currency_for_country(&self, country_code: &str) -> GeoCurrency {
        let is_india = country_code == "IN";
        if is_india {
            GeoCurrency {
                country_code: country_code.to_string(),
                is_india: true,
                currency: "INR".to_string(),
                currency_symbol: "₹".to_string(),
                conversion_rate: self.inr_conversion_rate,
            }
        } else {
            GeoCurrency {
                country_code: country_code.to_string(),
                is_india: false,
                currency: "USD".to_string(),
                currency_symbol: "$".to_string(),
                conversion_rate: 1.0,
            }
        }
    }
}

#[async_trait]
impl GeoService for GeoServiceImpl {
    async fn currency_for_ip(&self, ip: &str) -> GeoCurrency {
        match self.locator.locate(ip).await {
            Ok(country_code) => {
                tracing::debug!("Geo lookup resolved: ip={}, country={}", ip, country_code);
                self.currency_for_country(&country_code)
            }
            Err(e) => {
                // Display-only data: degrade to USD defaults rather than failing the request
                tracing::warn!("Geo lookup failed, using defaults: ip={}, error={}", ip, e);
                self.currency_for_country("US")
            }
        }
    }
}
