pub mod coingecko;
pub mod kraken;
pub mod market_info;
pub mod metrics;
pub mod news;
pub mod price_source;
pub mod sampler;

pub use coingecko::CoinGeckoClient;
pub use kraken::KrakenClient;
pub use market_info::*;
pub use metrics::SamplerMetrics;
pub use news::NewsClient;
pub use price_source::*;
pub use sampler::*;
