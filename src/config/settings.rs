use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use url::Url;

use crate::error::AppError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub api: ApiSettings,
    pub sampler: SamplerSettings,
    pub price_source: PriceSourceSettings,
    pub market: MarketSettings,
    pub news: NewsSettings,
    pub logging: LoggingSettings,
    /// Problems found while applying deployment variables, reported by `validate`.
    #[serde(skip)]
    pub override_errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseEngine {
    Postgres,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
}

/// One side of the sampled pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSettings {
    /// Identifier understood by id-keyed sources (CoinGecko).
    pub id: String,
    /// Symbol written to the prices table.
    pub symbol: String,
    /// Ticker pair understood by pair-keyed sources (Kraken).
    pub pair: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerSettings {
    pub interval_seconds: u64,
    pub retry_delay_seconds: u64,
    pub asset_a: AssetSettings,
    pub asset_b: AssetSettings,
    pub record_log_entries: bool,
    pub recent_limit: i64,
    pub chart_limit: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceProvider {
    Coingecko,
    Kraken,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceSourceSettings {
    pub provider: PriceProvider,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub quote_currency: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSettings {
    pub reference_asset: AssetSettings,
    pub rpc_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsSettings {
    pub url: String,
    pub auth_token: Option<String>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            url: "sqlite://trading_bot.db".to_string(),
            max_connections: 20,
            min_connections: 1,
            acquire_timeout_seconds: 30,
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for SamplerSettings {
    fn default() -> Self {
        SamplerSettings {
            interval_seconds: 60,
            retry_delay_seconds: 30,
            asset_a: AssetSettings {
                id: "matic-network".to_string(),
                symbol: "MATIC".to_string(),
                pair: "MATICUSDT".to_string(),
            },
            asset_b: AssetSettings {
                id: "usd-coin".to_string(),
                symbol: "USDC".to_string(),
                pair: "USDCUSDT".to_string(),
            },
            record_log_entries: false,
            recent_limit: 10,
            chart_limit: 100,
        }
    }
}

impl Default for PriceSourceSettings {
    fn default() -> Self {
        PriceSourceSettings {
            provider: PriceProvider::Coingecko,
            base_url: None,
            api_key: None,
            quote_currency: "usd".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl Default for MarketSettings {
    fn default() -> Self {
        MarketSettings {
            reference_asset: AssetSettings {
                id: "bitcoin".to_string(),
                symbol: "BTC".to_string(),
                pair: "XBTUSDT".to_string(),
            },
            rpc_url: None,
        }
    }
}

impl Default for NewsSettings {
    fn default() -> Self {
        NewsSettings {
            url: "https://cryptopanic.com/api/v1/posts/".to_string(),
            auth_token: None,
            timeout_seconds: 10,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl DatabaseSettings {
    pub fn engine(&self) -> Result<DatabaseEngine, AppError> {
        let url = self.url.trim();
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(DatabaseEngine::Postgres)
        } else if url.starts_with("sqlite:") {
            Ok(DatabaseEngine::Sqlite)
        } else {
            Err(AppError::ConfigError(format!(
                "Unsupported database URL scheme: {}",
                url.split(':').next().unwrap_or_default()
            )))
        }
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }

    /// Builds a PostgreSQL URL from the discrete `DB_*` variables,
    /// percent-encoding the credentials and database name.
    pub fn url_from_parts(
        host: &str,
        name: &str,
        user: &str,
        password: &str,
        port: u16,
        sslmode: &str,
    ) -> Result<String, AppError> {
        let mut url = Url::parse(&format!("postgresql://{}:{}", host, port))
            .map_err(|e| AppError::ConfigError(format!("Invalid DB_HOST {}: {}", host, e)))?;
        let invalid = |field: &str| AppError::ConfigError(format!("Cannot use {} in a database URL", field));

        url.path_segments_mut()
            .map_err(|_| invalid("DB_NAME"))?
            .clear()
            .push(name);
        url.set_username(user).map_err(|_| invalid("DB_USER"))?;
        if !password.is_empty() {
            url.set_password(Some(password)).map_err(|_| invalid("DB_PASSWORD"))?;
        }
        url.query_pairs_mut().append_pair("sslmode", sslmode);

        Ok(url.into())
    }
}

impl SamplerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds)
    }
}

impl PriceSourceSettings {
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => match self.provider {
                PriceProvider::Coingecko => "https://api.coingecko.com/api/v3".to_string(),
                PriceProvider::Kraken => "https://api.kraken.com".to_string(),
            },
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Settings {
    /// Load settings from defaults, optional config files and the environment.
    pub fn new() -> Result<Self, AppError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("PRICE_MONITOR").separator("__"))
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;
        settings.apply_env_overrides(|key| env::var(key).ok());
        settings.validate()?;

        Ok(settings)
    }

    /// Applies the well-known deployment variables on top of layered config.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = non_empty("DATABASE_URL") {
            self.database.url = url;
        } else if let Some(host) = non_empty("DB_HOST") {
            let port = match non_empty("DB_PORT") {
                Some(raw) => raw.parse::<u16>().map_err(|_| format!("DB_PORT is not a valid port: {}", raw)),
                None => Ok(5432),
            };
            let url = port.and_then(|port| {
                DatabaseSettings::url_from_parts(
                    &host,
                    &non_empty("DB_NAME").unwrap_or_else(|| "postgres".to_string()),
                    &non_empty("DB_USER").unwrap_or_else(|| "postgres".to_string()),
                    &non_empty("DB_PASSWORD").unwrap_or_default(),
                    port,
                    &non_empty("DB_SSLMODE").unwrap_or_else(|| "require".to_string()),
                )
                .map_err(|e| e.to_string())
            });
            match url {
                Ok(url) => self.database.url = url,
                Err(e) => self.override_errors.push(e),
            }
        }

        if let Some(host) = non_empty("API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = non_empty("API_PORT").and_then(|p| p.parse().ok()) {
            self.api.port = port;
        }
        if let Some(key) = non_empty("COINGECKO_API_KEY") {
            self.price_source.api_key = Some(key);
        }
        if let Some(url) = non_empty("ALCHEMY_URL") {
            self.market.rpc_url = Some(url);
        }
        if let Some(token) = non_empty("CRYPTOPANIC_TOKEN") {
            self.news.auth_token = Some(token);
        }
        if let Some(level) = non_empty("LOG_LEVEL") {
            self.logging.level = level;
        }
    }
}
