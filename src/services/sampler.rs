use std::sync::Arc;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use tracing::{debug, error, info, warn};

use crate::config::{AssetSettings, Settings};
use crate::database::PriceStore;
use crate::error::AppError;
use crate::models::{is_valid_price, NewPriceSample, PriceSample};
use crate::services::metrics::SamplerMetrics;
use crate::services::price_source::{PriceError, PriceSource, SpotPrices};

/// Everything that can go wrong in one sampling cycle. The loop treats every
/// variant the same way: log it and try again after the retry delay.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("Price fetch failed: {0}")]
    Fetch(#[from] PriceError),

    #[error("No price returned for {0}")]
    MissingPrice(String),

    #[error("Invalid price for {asset}: {price}")]
    InvalidPrice { asset: String, price: f64 },

    #[error("Sample rejected: {0}")]
    InvalidSample(AppError),

    #[error("Failed to store sample: {0}")]
    Store(#[from] AppError),
}

/// The two fixed delays driving the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerSchedule {
    pub interval: Duration,
    pub retry_delay: Duration,
}

impl SamplerSchedule {
    pub fn new(interval: Duration, retry_delay: Duration) -> Self {
        Self { interval, retry_delay }
    }

    /// How long to wait before the next attempt given how the last one ended.
    pub fn delay_after<T, E>(&self, outcome: &Result<T, E>) -> Duration {
        match outcome {
            Ok(_) => self.interval,
            Err(_) => self.retry_delay,
        }
    }

    fn retry_strategy(&self) -> FixedInterval {
        FixedInterval::new(self.retry_delay)
    }
}

pub struct PriceSampler {
    source: Arc<dyn PriceSource>,
    store: Arc<dyn PriceStore>,
    asset_a: AssetSettings,
    asset_b: AssetSettings,
    quote_currency: String,
    schedule: SamplerSchedule,
    record_log_entries: bool,
    metrics: Option<SamplerMetrics>,
}

impl PriceSampler {
    pub fn new(source: Arc<dyn PriceSource>, store: Arc<dyn PriceStore>, settings: &Settings) -> Self {
        Self {
            source,
            store,
            asset_a: settings.sampler.asset_a.clone(),
            asset_b: settings.sampler.asset_b.clone(),
            quote_currency: settings.price_source.quote_currency.clone(),
            schedule: SamplerSchedule::new(settings.sampler.interval(), settings.sampler.retry_delay()),
            record_log_entries: settings.sampler.record_log_entries,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: SamplerMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn schedule(&self) -> SamplerSchedule {
        self.schedule
    }

    /// Fetches both prices and stores one row.
    pub async fn sample_once(&self) -> Result<PriceSample, SampleError> {
        let outcome = self.fetch_and_store().await;
        if let Some(metrics) = &self.metrics {
            match &outcome {
                Ok(sample) => metrics.record_stored(sample.captured_at),
                Err(_) => metrics.record_failed(),
            }
        }
        outcome
    }

    /// Samples forever. Failed cycles are retried on the fixed retry delay
    /// until one succeeds, then the loop waits the full interval.
    pub async fn run(self) {
        info!(
            source = self.source.name(),
            asset_a = %self.asset_a.symbol,
            asset_b = %self.asset_b.symbol,
            interval_seconds = self.schedule.interval.as_secs(),
            retry_delay_seconds = self.schedule.retry_delay.as_secs(),
            "Price sampler started"
        );

        loop {
            let outcome = Retry::spawn(self.schedule.retry_strategy(), || self.attempt()).await;
            tokio::time::sleep(self.schedule.delay_after(&outcome)).await;
        }
    }

    async fn attempt(&self) -> Result<PriceSample, SampleError> {
        self.sample_once().await.map_err(|e| {
            error!(
                error = %e,
                retry_in_seconds = self.schedule.retry_delay.as_secs(),
                "Sampling cycle failed"
            );
            e
        })
    }

    async fn fetch_and_store(&self) -> Result<PriceSample, SampleError> {
        let assets = [self.asset_a.clone(), self.asset_b.clone()];
        let prices = self
            .source
            .fetch_spot_prices(&assets, &self.quote_currency)
            .await?;
        debug!(source = self.source.name(), ?prices, "Fetched spot prices");

        let price_a = extract_price(&prices, &self.asset_a)?;
        let price_b = extract_price(&prices, &self.asset_b)?;

        let sample = NewPriceSample::new(&self.asset_a.symbol, price_a, &self.asset_b.symbol, price_b)
            .map_err(SampleError::InvalidSample)?;
        let stored = self.store.insert_sample(&sample).await?;

        let message = format!(
            "Prices stored: {}={}, {}={}",
            stored.asset_a_symbol, stored.asset_a_price, stored.asset_b_symbol, stored.asset_b_price
        );
        info!(id = stored.id, "{}", message);

        if self.record_log_entries {
            if let Err(e) = self.store.append_log(&message).await {
                warn!(error = %e, "Failed to record log entry");
            }
        }

        Ok(stored)
    }
}

fn extract_price(prices: &SpotPrices, asset: &AssetSettings) -> Result<f64, SampleError> {
    let price = *prices
        .get(&asset.id)
        .ok_or_else(|| SampleError::MissingPrice(asset.id.clone()))?;
    if !is_valid_price(price) {
        return Err(SampleError::InvalidPrice {
            asset: asset.id.clone(),
            price,
        });
    }
    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LogEntry, PriceStats};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays scripted responses, then repeats the fallback forever.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<SpotPrices, PriceError>>>,
        fallback: SpotPrices,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<SpotPrices, PriceError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                fallback: prices(0.50, 1.00),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch_spot_prices(
            &self,
            _assets: &[AssetSettings],
            _quote_currency: &str,
        ) -> Result<SpotPrices, PriceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(self.fallback.clone()))
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<Vec<PriceSample>>,
        logs: Mutex<Vec<String>>,
        failing_inserts: AtomicUsize,
        fail_logs: bool,
    }

    #[async_trait]
    impl PriceStore for MemoryStore {
        async fn insert_sample(&self, sample: &NewPriceSample) -> Result<PriceSample, AppError> {
            if self
                .failing_inserts
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(AppError::DatabaseError("connection refused".to_string()));
            }
            let mut rows = self.rows.lock().unwrap();
            let stored = PriceSample {
                id: rows.len() as i64 + 1,
                captured_at: Utc::now(),
                asset_a_symbol: sample.asset_a_symbol.clone(),
                asset_a_price: sample.asset_a_price,
                asset_b_symbol: sample.asset_b_symbol.clone(),
                asset_b_price: sample.asset_b_price,
            };
            rows.push(stored.clone());
            Ok(stored)
        }

        async fn count_samples(&self) -> Result<i64, AppError> {
            Ok(self.rows.lock().unwrap().len() as i64)
        }

        async fn recent_samples(&self, limit: i64) -> Result<Vec<PriceSample>, AppError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().rev().take(limit as usize).cloned().collect())
        }

        async fn price_stats(&self) -> Result<PriceStats, AppError> {
            Ok(PriceStats::default())
        }

        async fn append_log(&self, message: &str) -> Result<LogEntry, AppError> {
            if self.fail_logs {
                return Err(AppError::DatabaseError("logs table missing".to_string()));
            }
            let mut logs = self.logs.lock().unwrap();
            logs.push(message.to_string());
            Ok(LogEntry {
                id: logs.len() as i64,
                message: message.to_string(),
                recorded_at: Utc::now(),
            })
        }

        async fn recent_logs(&self, _limit: i64) -> Result<Vec<LogEntry>, AppError> {
            Ok(Vec::new())
        }

        async fn ping(&self) -> Result<(), AppError> {
            Ok(())
        }
    }

    impl MemoryStore {
        fn row_count(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    fn prices(a: f64, b: f64) -> SpotPrices {
        SpotPrices::from([
            ("matic-network".to_string(), a),
            ("usd-coin".to_string(), b),
        ])
    }

    fn sampler(source: Arc<ScriptedSource>, store: Arc<MemoryStore>) -> PriceSampler {
        PriceSampler::new(source, store, &Settings::default())
    }

    #[tokio::test]
    async fn test_successful_cycle_stores_one_row() {
        let source = ScriptedSource::new(vec![Ok(prices(0.50, 1.00))]);
        let store = Arc::new(MemoryStore::default());

        let stored = sampler(source, store.clone()).sample_once().await.unwrap();

        assert_eq!(store.row_count(), 1);
        assert_eq!(stored.asset_a_symbol, "MATIC");
        assert_eq!(stored.asset_a_price, 0.50);
        assert_eq!(stored.asset_b_symbol, "USDC");
        assert_eq!(stored.asset_b_price, 1.00);
    }

    #[tokio::test]
    async fn test_fetch_error_stores_nothing() {
        let source = ScriptedSource::new(vec![Err(PriceError::RateLimitExceeded)]);
        let store = Arc::new(MemoryStore::default());

        let result = sampler(source, store.clone()).sample_once().await;

        assert!(matches!(result, Err(SampleError::Fetch(PriceError::RateLimitExceeded))));
        assert_eq!(store.row_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_and_invalid_prices_store_nothing() {
        let missing = SpotPrices::from([("matic-network".to_string(), 0.5)]);
        let source = ScriptedSource::new(vec![Ok(missing), Ok(prices(0.0, 1.0)), Ok(prices(f64::NAN, 1.0))]);
        let store = Arc::new(MemoryStore::default());
        let sampler = sampler(source, store.clone());

        assert!(matches!(
            sampler.sample_once().await,
            Err(SampleError::MissingPrice(id)) if id == "usd-coin"
        ));
        assert!(matches!(
            sampler.sample_once().await,
            Err(SampleError::InvalidPrice { asset, .. }) if asset == "matic-network"
        ));
        assert!(matches!(sampler.sample_once().await, Err(SampleError::InvalidPrice { .. })));
        assert_eq!(store.row_count(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_sample_error() {
        let source = ScriptedSource::new(vec![]);
        let store = Arc::new(MemoryStore {
            failing_inserts: AtomicUsize::new(1),
            ..MemoryStore::default()
        });

        let result = sampler(source, store.clone()).sample_once().await;
        assert!(matches!(result, Err(SampleError::Store(AppError::DatabaseError(_)))));
        assert_eq!(store.row_count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_sample_is_not_a_store_failure() {
        let mut settings = Settings::default();
        settings.sampler.asset_a.symbol = " ".to_string();
        let store = Arc::new(MemoryStore::default());

        let result = PriceSampler::new(ScriptedSource::new(vec![]), store.clone(), &settings)
            .sample_once()
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, SampleError::InvalidSample(AppError::ValidationError(_))));
        assert!(err.to_string().starts_with("Sample rejected"));
        assert_eq!(store.row_count(), 0);
    }

    #[tokio::test]
    async fn test_log_entry_written_when_enabled() {
        let mut settings = Settings::default();
        settings.sampler.record_log_entries = true;
        let store = Arc::new(MemoryStore::default());

        PriceSampler::new(ScriptedSource::new(vec![]), store.clone(), &settings)
            .sample_once()
            .await
            .unwrap();

        let logs = store.logs.lock().unwrap().clone();
        assert_eq!(logs, vec!["Prices stored: MATIC=0.5, USDC=1".to_string()]);
    }

    #[tokio::test]
    async fn test_log_failure_does_not_fail_cycle() {
        let mut settings = Settings::default();
        settings.sampler.record_log_entries = true;
        let store = Arc::new(MemoryStore {
            fail_logs: true,
            ..MemoryStore::default()
        });

        let result = PriceSampler::new(ScriptedSource::new(vec![]), store.clone(), &settings)
            .sample_once()
            .await;
        assert!(result.is_ok());
        assert_eq!(store.row_count(), 1);
    }

    #[tokio::test]
    async fn test_metrics_count_outcomes() {
        let metrics = SamplerMetrics::new().unwrap();
        let source = ScriptedSource::new(vec![Err(PriceError::Request("timeout".to_string()))]);
        let sampler = sampler(source, Arc::new(MemoryStore::default())).with_metrics(metrics.clone());

        let _ = sampler.sample_once().await;
        let _ = sampler.sample_once().await;

        assert_eq!(metrics.cycles(crate::services::metrics::OUTCOME_FAILED), 1);
        assert_eq!(metrics.cycles(crate::services::metrics::OUTCOME_STORED), 1);
    }

    #[test]
    fn test_delay_after_outcome() {
        let schedule = SamplerSchedule::new(Duration::from_secs(60), Duration::from_secs(30));
        assert_eq!(schedule.delay_after(&Ok::<(), ()>(())), Duration::from_secs(60));
        assert_eq!(schedule.delay_after(&Err::<(), ()>(())), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_retries_after_short_delay_then_waits_interval() {
        let source = ScriptedSource::new(vec![Err(PriceError::ApiError("503".to_string()))]);
        let store = Arc::new(MemoryStore::default());
        let handle = tokio::spawn(sampler(source.clone(), store.clone()).run());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.calls(), 1);
        assert_eq!(store.row_count(), 0);

        // Retried after 30s, not 60s.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(source.calls(), 2);
        assert_eq!(store.row_count(), 1);

        // Next cycle only after the full interval.
        tokio::time::sleep(Duration::from_secs(58)).await;
        assert_eq!(source.calls(), 2);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(source.calls(), 3);
        assert_eq!(store.row_count(), 2);

        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_survives_repeated_store_failures() {
        let source = ScriptedSource::new(vec![]);
        let store = Arc::new(MemoryStore {
            failing_inserts: AtomicUsize::new(3),
            ..MemoryStore::default()
        });
        let handle = tokio::spawn(sampler(source.clone(), store.clone()).run());

        tokio::time::sleep(Duration::from_secs(91)).await;
        assert_eq!(source.calls(), 4);
        assert_eq!(store.row_count(), 1);
        assert!(!handle.is_finished());
        handle.abort();
    }
}
