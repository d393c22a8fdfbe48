use axum::{extract::State, response::Json};

use crate::error::AppError;
use crate::services::MarketSnapshot;
use crate::AppState;

pub async fn strategy(State(state): State<AppState>) -> Result<Json<MarketSnapshot>, AppError> {
    Ok(Json(state.market.snapshot().await?))
}
