use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};

use crate::error::AppError;

/// One stored row of the `prices` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PriceSample {
    pub id: i64,
    #[sqlx(rename = "timestamp")]
    pub captured_at: DateTime<Utc>,
    #[sqlx(rename = "token1")]
    pub asset_a_symbol: String,
    #[sqlx(rename = "price1")]
    pub asset_a_price: f64,
    #[sqlx(rename = "token2")]
    pub asset_b_symbol: String,
    #[sqlx(rename = "price2")]
    pub asset_b_price: f64,
}

/// Insert payload; the store assigns `id` and the timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPriceSample {
    pub asset_a_symbol: String,
    pub asset_a_price: f64,
    pub asset_b_symbol: String,
    pub asset_b_price: f64,
}

impl NewPriceSample {
    pub fn new(
        asset_a_symbol: impl Into<String>,
        asset_a_price: f64,
        asset_b_symbol: impl Into<String>,
        asset_b_price: f64,
    ) -> Result<Self, AppError> {
        let sample = Self {
            asset_a_symbol: asset_a_symbol.into(),
            asset_a_price,
            asset_b_symbol: asset_b_symbol.into(),
            asset_b_price,
        };
        sample.validate()?;
        Ok(sample)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        for (symbol, price) in [
            (&self.asset_a_symbol, self.asset_a_price),
            (&self.asset_b_symbol, self.asset_b_price),
        ] {
            if symbol.trim().is_empty() {
                return Err(AppError::ValidationError("Asset symbol cannot be empty".to_string()));
            }
            if !is_valid_price(price) {
                return Err(AppError::ValidationError(format!(
                    "Price for {} must be finite and positive, got {}",
                    symbol, price
                )));
            }
        }
        Ok(())
    }
}

pub fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Min/max/avg of one price column. All `None` when the table is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetStats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    pub asset_a: AssetStats,
    pub asset_b: AssetStats,
}
