use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{AssetSettings, PriceProvider, PriceSourceSettings};
use crate::error::AppError;
use crate::services::coingecko::CoinGeckoClient;
use crate::services::kraken::KrakenClient;

#[derive(Debug, thiserror::Error)]
pub enum PriceError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl From<PriceError> for AppError {
    fn from(err: PriceError) -> Self {
        AppError::ExternalApiError(err.to_string())
    }
}

/// Spot price per asset id, in the requested quote currency.
pub type SpotPrices = HashMap<String, f64>;

/// An external service returning current spot prices for named assets.
///
/// Assets the source does not know are left out of the result rather than
/// failing the whole call; callers decide whether a missing price matters.
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_spot_prices(
        &self,
        assets: &[AssetSettings],
        quote_currency: &str,
    ) -> Result<SpotPrices, PriceError>;
}

pub fn build_price_source(settings: &PriceSourceSettings) -> Result<Arc<dyn PriceSource>, AppError> {
    let client = Client::builder()
        .timeout(settings.timeout())
        .user_agent(concat!("price-monitor/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::ExternalApiError(format!("Failed to create HTTP client: {}", e)))?;

    let source: Arc<dyn PriceSource> = match settings.provider {
        PriceProvider::Coingecko => Arc::new(CoinGeckoClient::new(
            client,
            settings.base_url(),
            settings.api_key.clone(),
        )),
        PriceProvider::Kraken => Arc::new(KrakenClient::new(client, settings.base_url())),
    };
    Ok(source)
}

/// Maps transport and status failures onto `PriceError`, passing 2xx through.
pub(crate) fn check_status(
    response: Result<Response, reqwest::Error>,
    source: &str,
) -> Result<Response, PriceError> {
    let response = response.map_err(|e| PriceError::Request(format!("{} request failed: {}", source, e)))?;

    if response.status() == StatusCode::TOO_MANY_REQUESTS {
        return Err(PriceError::RateLimitExceeded);
    }
    if !response.status().is_success() {
        return Err(PriceError::ApiError(format!(
            "{} API returned status: {}",
            source,
            response.status()
        )));
    }
    Ok(response)
}
