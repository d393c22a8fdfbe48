use axum::{extract::State, response::Json};
use serde_json::Value;

use crate::error::AppError;
use crate::AppState;

pub async fn news(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    Ok(Json(state.news.latest().await?))
}
