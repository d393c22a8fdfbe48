use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use super::{AssetStats, PriceSample, PriceStats};

/// Landing page summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_records: i64,
    pub last_records: Vec<PriceSample>,
    pub asset_a_symbol: String,
    pub asset_b_symbol: String,
    pub asset_a_stats: AssetStats,
    pub asset_b_stats: AssetStats,
}

impl DashboardSummary {
    pub fn new(
        total_records: i64,
        last_records: Vec<PriceSample>,
        stats: PriceStats,
        asset_a_symbol: &str,
        asset_b_symbol: &str,
    ) -> Self {
        Self {
            total_records,
            last_records,
            asset_a_symbol: asset_a_symbol.to_string(),
            asset_b_symbol: asset_b_symbol.to_string(),
            asset_a_stats: stats.asset_a,
            asset_b_stats: stats.asset_b,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<f64>,
}

/// Data behind the price chart, oldest point first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceChart {
    pub title: String,
    pub timestamps: Vec<DateTime<Utc>>,
    pub series: Vec<ChartSeries>,
}

impl PriceChart {
    /// Builds the chart from samples as returned by `recent_samples` (newest first).
    pub fn from_recent(samples: &[PriceSample], asset_a_symbol: &str, asset_b_symbol: &str) -> Self {
        let ordered: Vec<&PriceSample> = samples.iter().rev().collect();

        Self {
            title: "Price chart".to_string(),
            timestamps: ordered.iter().map(|s| s.captured_at).collect(),
            series: vec![
                ChartSeries {
                    name: format!("{} price", asset_a_symbol),
                    values: ordered.iter().map(|s| s.asset_a_price).collect(),
                },
                ChartSeries {
                    name: format!("{} price", asset_b_symbol),
                    values: ordered.iter().map(|s| s.asset_b_price).collect(),
                },
            ],
        }
    }
}
