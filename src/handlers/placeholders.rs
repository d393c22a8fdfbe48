//! Static documents for views that have no live data source.

use axum::response::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub loss: f64,
    pub predictions: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct LiquidityPool {
    pub name: &'static str,
    pub token1: &'static str,
    pub token2: &'static str,
    pub volume: u64,
}

pub async fn ml_metrics() -> Json<ModelMetrics> {
    Json(ModelMetrics {
        accuracy: 0.95,
        loss: 0.05,
        predictions: vec![1, 0, 1, 1, 0],
    })
}

pub async fn liquidity() -> Json<Vec<LiquidityPool>> {
    Json(vec![
        LiquidityPool {
            name: "pool1",
            token1: "MATIC",
            token2: "USDC",
            volume: 1_000_000,
        },
        LiquidityPool {
            name: "pool2",
            token1: "ETH",
            token2: "USDC",
            volume: 500_000,
        },
    ])
}
