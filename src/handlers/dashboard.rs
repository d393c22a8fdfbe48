use axum::{extract::State, response::Json};
use tracing::debug;

use crate::error::AppError;
use crate::models::{DashboardSummary, PriceChart};
use crate::AppState;

/// Record count, latest samples and per-asset min/max/avg.
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardSummary>, AppError> {
    let sampler = &state.settings.sampler;

    let total_records = state.store.count_samples().await?;
    let last_records = state.store.recent_samples(sampler.recent_limit).await?;
    let stats = state.store.price_stats().await?;
    debug!(total_records, "Serving dashboard");

    Ok(Json(DashboardSummary::new(
        total_records,
        last_records,
        stats,
        &sampler.asset_a.symbol,
        &sampler.asset_b.symbol,
    )))
}

pub async fn chart(State(state): State<AppState>) -> Result<Json<PriceChart>, AppError> {
    let sampler = &state.settings.sampler;
    let samples = state.store.recent_samples(sampler.chart_limit).await?;

    Ok(Json(PriceChart::from_recent(
        &samples,
        &sampler.asset_a.symbol,
        &sampler.asset_b.symbol,
    )))
}
