use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use tracing::debug;

use crate::config::AssetSettings;
use crate::services::price_source::{check_status, PriceError, PriceSource, SpotPrices};

/// `{"matic-network": {"usd": 0.5}, "usd-coin": {"usd": 1.0}}`
type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

/// CoinGecko `simple/price` client keyed by coin id.
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoClient {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    fn name(&self) -> &str {
        "coingecko"
    }

    async fn fetch_spot_prices(
        &self,
        assets: &[AssetSettings],
        quote_currency: &str,
    ) -> Result<SpotPrices, PriceError> {
        let ids = assets
            .iter()
            .map(|asset| asset.id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let quote = quote_currency.to_lowercase();

        let mut request = self
            .client
            .get(format!("{}/simple/price", self.base_url))
            .query(&[("ids", ids.as_str()), ("vs_currencies", quote.as_str())]);
        if let Some(api_key) = &self.api_key {
            request = request.query(&[("x_cg_demo_api_key", api_key.as_str())]);
        }

        debug!(ids = %ids, quote = %quote, "Requesting CoinGecko spot prices");
        let response = check_status(request.send().await, self.name())?;

        let body = response
            .text()
            .await
            .map_err(|e| PriceError::Request(format!("Failed to read response: {}", e)))?;
        let parsed: SimplePriceResponse = serde_json::from_str(&body)
            .map_err(|e| PriceError::InvalidResponse(format!("JSON parse error: {}", e)))?;

        Ok(parsed
            .into_iter()
            .filter_map(|(id, quotes)| quotes.get(&quote).map(|price| (id, *price)))
            .collect())
    }
}
