use prometheus::{Encoder, Gauge, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::AppError;

pub const OUTCOME_STORED: &str = "stored";
pub const OUTCOME_FAILED: &str = "failed";

/// Prometheus instruments for the sampling loop.
///
/// Counts are informational only; the loop never reads them back.
#[derive(Clone)]
pub struct SamplerMetrics {
    registry: Registry,
    cycles: IntCounterVec,
    last_sample_timestamp: Gauge,
}

impl SamplerMetrics {
    pub fn new() -> Result<Self, AppError> {
        let registry = Registry::new_custom(Some("price_monitor".to_string()), None)?;

        let cycles = IntCounterVec::new(
            Opts::new("sampler_cycles_total", "Sampling attempts by outcome"),
            &["outcome"],
        )?;
        let last_sample_timestamp = Gauge::new(
            "sampler_last_sample_timestamp_seconds",
            "Unix time of the most recently stored sample",
        )?;

        registry.register(Box::new(cycles.clone()))?;
        registry.register(Box::new(last_sample_timestamp.clone()))?;

        Ok(Self {
            registry,
            cycles,
            last_sample_timestamp,
        })
    }

    pub fn record_stored(&self, captured_at: chrono::DateTime<chrono::Utc>) {
        self.cycles.with_label_values(&[OUTCOME_STORED]).inc();
        self.last_sample_timestamp
            .set(captured_at.timestamp_millis() as f64 / 1000.0);
    }

    pub fn record_failed(&self) {
        self.cycles.with_label_values(&[OUTCOME_FAILED]).inc();
    }

    pub fn cycles(&self, outcome: &str) -> u64 {
        self.cycles.with_label_values(&[outcome]).get()
    }

    /// Text exposition format, as served on `/metrics`.
    pub fn export(&self) -> Result<String, AppError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| AppError::InternalError(format!("Metrics are not valid UTF-8: {}", e)))
    }
}
