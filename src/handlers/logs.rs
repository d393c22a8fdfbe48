use axum::{extract::State, response::Json};

use crate::error::AppError;
use crate::models::LogEntry;
use crate::AppState;

pub async fn recent_logs(State(state): State<AppState>) -> Result<Json<Vec<LogEntry>>, AppError> {
    let entries = state
        .store
        .recent_logs(state.settings.sampler.recent_limit)
        .await?;
    Ok(Json(entries))
}
