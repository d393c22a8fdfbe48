#![allow(dead_code)]

use async_trait::async_trait;
use price_monitor::{
    config::{DatabaseSettings, PriceSourceSettings, Settings},
    database::{establish_connection, price_store_for, run_migrations, DatabasePool, PriceStore},
    error::AppError,
    models::{LogEntry, NewPriceSample, PriceSample, PriceStats},
};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub async fn memory_pool() -> DatabasePool {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        ..DatabaseSettings::default()
    };
    let pool = establish_connection(&settings).await.unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}

pub async fn memory_store() -> Arc<dyn PriceStore> {
    price_store_for(&memory_pool().await)
}

/// Settings pointing the price source at a mock server.
pub fn settings_for(server: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.price_source = PriceSourceSettings {
        base_url: Some(server.uri()),
        ..PriceSourceSettings::default()
    };
    settings.news.url = format!("{}/news", server.uri());
    settings
}

pub async fn mount_coingecko(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/simple/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// A store whose every call fails as if the database were unreachable.
pub struct UnreachableStore;

fn unreachable() -> AppError {
    AppError::DatabaseError("pool timed out while waiting for an open connection".to_string())
}

#[async_trait]
impl PriceStore for UnreachableStore {
    async fn insert_sample(&self, _sample: &NewPriceSample) -> Result<PriceSample, AppError> {
        Err(unreachable())
    }

    async fn count_samples(&self) -> Result<i64, AppError> {
        Err(unreachable())
    }

    async fn recent_samples(&self, _limit: i64) -> Result<Vec<PriceSample>, AppError> {
        Err(unreachable())
    }

    async fn price_stats(&self) -> Result<PriceStats, AppError> {
        Err(unreachable())
    }

    async fn append_log(&self, _message: &str) -> Result<LogEntry, AppError> {
        Err(unreachable())
    }

    async fn recent_logs(&self, _limit: i64) -> Result<Vec<LogEntry>, AppError> {
        Err(unreachable())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Err(unreachable())
    }
}
