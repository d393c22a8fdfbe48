pub mod dashboard;
pub mod health;
pub mod logs;
pub mod metrics;
pub mod news;
pub mod placeholders;
pub mod strategy;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub use dashboard::{chart, dashboard};
pub use health::health_check;
pub use logs::recent_logs;
pub use metrics::metrics_handler;
pub use news::news;
pub use placeholders::{liquidity, ml_metrics};
pub use strategy::strategy;

/// All read-only dashboard routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/chart", get(chart))
        .route("/strategy", get(strategy))
        .route("/news", get(news))
        .route("/ml", get(ml_metrics))
        .route("/liquidity", get(liquidity))
        .route("/logs", get(recent_logs))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
