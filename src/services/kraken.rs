use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use crate::config::AssetSettings;
use crate::services::price_source::{check_status, PriceError, PriceSource, SpotPrices};

#[derive(Debug, Deserialize)]
struct TickerResponse {
    #[serde(default)]
    error: Vec<String>,
    #[serde(default)]
    result: HashMap<String, TickerInfo>,
}

#[derive(Debug, Deserialize)]
struct TickerInfo {
    /// Last trade closed: `[price, lot volume]`.
    c: Vec<String>,
}

/// Kraken public ticker client; prices are the last traded price of each
/// asset's configured pair, so the quote currency is implied by the pair.
pub struct KrakenClient {
    client: Client,
    base_url: String,
}

impl KrakenClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn last_price(&self, pair: &str) -> Result<f64, PriceError> {
        let request = self
            .client
            .get(format!("{}/0/public/Ticker", self.base_url))
            .query(&[("pair", pair)]);

        debug!(pair = %pair, "Requesting Kraken ticker");
        let response = check_status(request.send().await, self.name())?;

        let parsed: TickerResponse = response
            .json()
            .await
            .map_err(|e| PriceError::InvalidResponse(format!("JSON parse error: {}", e)))?;

        if !parsed.error.is_empty() {
            return Err(PriceError::ApiError(parsed.error.join(", ")));
        }

        // Kraken may answer under its own pair alias (e.g. XXBTZUSD), so take
        // the single entry rather than looking up the requested name.
        let ticker = parsed
            .result
            .into_values()
            .next()
            .ok_or_else(|| PriceError::InvalidResponse(format!("No ticker returned for {}", pair)))?;

        ticker
            .c
            .first()
            .and_then(|last| last.parse::<f64>().ok())
            .ok_or_else(|| PriceError::InvalidResponse(format!("Missing last price for {}", pair)))
    }
}

#[async_trait]
impl PriceSource for KrakenClient {
    fn name(&self) -> &str {
        "kraken"
    }

    async fn fetch_spot_prices(
        &self,
        assets: &[AssetSettings],
        _quote_currency: &str,
    ) -> Result<SpotPrices, PriceError> {
        let mut prices = SpotPrices::new();
        for asset in assets {
            let price = self.last_price(&asset.pair).await?;
            prices.insert(asset.id.clone(), price);
        }
        Ok(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn asset(id: &str, pair: &str) -> AssetSettings {
        AssetSettings {
            id: id.to_string(),
            symbol: id.to_uppercase(),
            pair: pair.to_string(),
        }
    }

    async fn mount_ticker(server: &MockServer, pair: &str, key: &str, last: &str) {
        Mock::given(method("GET"))
            .and(path("/0/public/Ticker"))
            .and(query_param("pair", pair))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": [],
                "result": { key: { "c": [last, "12.5"] } }
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_last_price_per_pair() {
        let server = MockServer::start().await;
        mount_ticker(&server, "MATICUSDT", "MATICUSDT", "0.5012").await;
        mount_ticker(&server, "USDCUSDT", "USDCUSDT", "1.0001").await;

        let client = KrakenClient::new(Client::new(), server.uri());
        let prices = client
            .fetch_spot_prices(
                &[asset("matic-network", "MATICUSDT"), asset("usd-coin", "USDCUSDT")],
                "usd",
            )
            .await
            .unwrap();

        assert_eq!(prices.get("matic-network"), Some(&0.5012));
        assert_eq!(prices.get("usd-coin"), Some(&1.0001));
    }

    #[tokio::test]
    async fn test_aliased_result_key() {
        let server = MockServer::start().await;
        mount_ticker(&server, "XBTUSDT", "XXBTZUSDT", "64000.1").await;

        let client = KrakenClient::new(Client::new(), server.uri());
        let prices = client
            .fetch_spot_prices(&[asset("bitcoin", "XBTUSDT")], "usd")
            .await
            .unwrap();
        assert_eq!(prices.get("bitcoin"), Some(&64000.1));
    }

    #[tokio::test]
    async fn test_error_array_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/0/public/Ticker"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": ["EQuery:Unknown asset pair"]
            })))
            .mount(&server)
            .await;

        let client = KrakenClient::new(Client::new(), server.uri());
        let result = client.fetch_spot_prices(&[asset("nope", "NOPEUSD")], "usd").await;
        assert!(matches!(result, Err(PriceError::ApiError(msg)) if msg.contains("Unknown asset pair")));
    }
}
