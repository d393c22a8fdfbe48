use alloy::{
    providers::{Provider, ProviderBuilder, RootProvider},
    transports::http::{Client, Http},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::config::{AssetSettings, Settings};
use crate::error::AppError;
use crate::services::price_source::PriceSource;

/// Payload of the strategy view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub reference_asset: String,
    pub reference_price: f64,
    pub quote_currency: String,
    /// `None` when no chain RPC endpoint is configured.
    pub block_number: Option<u64>,
    pub fetched_at: DateTime<Utc>,
}

pub struct MarketInfoService {
    source: Arc<dyn PriceSource>,
    reference_asset: AssetSettings,
    quote_currency: String,
    chain_provider: Option<Arc<RootProvider<Http<Client>>>>,
}

impl MarketInfoService {
    pub fn new(source: Arc<dyn PriceSource>, settings: &Settings) -> Result<Self, AppError> {
        let chain_provider = match &settings.market.rpc_url {
            Some(rpc_url) => {
                let url = rpc_url
                    .parse::<Url>()
                    .map_err(|e| AppError::BlockchainError(format!("Invalid RPC URL: {}", e)))?;
                Some(Arc::new(ProviderBuilder::new().on_http(url)))
            }
            None => {
                info!("No chain RPC URL configured, block lookups disabled");
                None
            }
        };

        Ok(Self {
            source,
            reference_asset: settings.market.reference_asset.clone(),
            quote_currency: settings.price_source.quote_currency.clone(),
            chain_provider,
        })
    }

    pub async fn snapshot(&self) -> Result<MarketSnapshot, AppError> {
        let prices = self
            .source
            .fetch_spot_prices(std::slice::from_ref(&self.reference_asset), &self.quote_currency)
            .await?;
        let reference_price = prices.get(&self.reference_asset.id).copied().ok_or_else(|| {
            AppError::ExternalApiError(format!("No price returned for {}", self.reference_asset.id))
        })?;

        Ok(MarketSnapshot {
            reference_asset: self.reference_asset.symbol.clone(),
            reference_price,
            quote_currency: self.quote_currency.clone(),
            block_number: self.latest_block().await?,
            fetched_at: Utc::now(),
        })
    }

    pub async fn latest_block(&self) -> Result<Option<u64>, AppError> {
        let Some(provider) = &self.chain_provider else {
            return Ok(None);
        };

        let block_number = provider
            .get_block_number()
            .await
            .map_err(|e| AppError::BlockchainError(format!("Failed to get block number: {}", e)))?;
        Ok(Some(block_number))
    }
}
