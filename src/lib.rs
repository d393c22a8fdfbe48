pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

pub use error::types::*;

use std::sync::Arc;

use crate::config::Settings;
use crate::database::PriceStore;
use crate::services::{MarketInfoService, NewsClient, SamplerMetrics};

/// Shared handles for the web layer. Built once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PriceStore>,
    pub market: Arc<MarketInfoService>,
    pub news: Arc<NewsClient>,
    pub metrics: SamplerMetrics,
    pub settings: Arc<Settings>,
}
