use crate::config::settings::{AssetSettings, Settings};
use crate::error::AppError;

impl Settings {
    /// Reject configurations the sampler or pool cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = self.override_errors.clone();

        if let Err(e) = self.database.engine() {
            errors.push(e.to_string());
        }
        if self.database.max_connections == 0 {
            errors.push("database.max_connections must be at least 1".to_string());
        }
        if self.database.min_connections > self.database.max_connections {
            errors.push("database.min_connections cannot exceed max_connections".to_string());
        }
        if self.sampler.interval_seconds == 0 {
            errors.push("sampler.interval_seconds must be positive".to_string());
        }
        if self.sampler.retry_delay_seconds == 0 {
            errors.push("sampler.retry_delay_seconds must be positive".to_string());
        }
        if self.sampler.recent_limit <= 0 || self.sampler.chart_limit <= 0 {
            errors.push("sampler.recent_limit and sampler.chart_limit must be positive".to_string());
        }
        if self.sampler.asset_a.id == self.sampler.asset_b.id {
            errors.push("sampler.asset_a and sampler.asset_b must be different assets".to_string());
        }
        for (name, asset) in [
            ("sampler.asset_a", &self.sampler.asset_a),
            ("sampler.asset_b", &self.sampler.asset_b),
            ("market.reference_asset", &self.market.reference_asset),
        ] {
            validate_asset(name, asset, &mut errors);
        }
        if self.price_source.quote_currency.trim().is_empty() {
            errors.push("price_source.quote_currency cannot be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::ConfigError(errors.join("; ")))
        }
    }
}

fn validate_asset(name: &str, asset: &AssetSettings, errors: &mut Vec<String>) {
    if asset.id.trim().is_empty() {
        errors.push(format!("{}.id cannot be empty", name));
    }
    if asset.symbol.trim().is_empty() {
        errors.push(format!("{}.symbol cannot be empty", name));
    }
}
