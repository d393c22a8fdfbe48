use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::AppState;

/// Prometheus text exposition of the sampler instruments.
pub async fn metrics_handler(State(state): State<AppState>) -> Result<Response, AppError> {
    let body = state.metrics.export()?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response())
}
