use price_monitor::{
    config::Settings,
    database::{establish_connection, price_store_for, run_migrations},
    handlers::create_router,
    services::{build_price_source, MarketInfoService, NewsClient, PriceSampler, SamplerMetrics},
    utils::init_tracing,
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let settings = Settings::new()?;
    init_tracing(&settings.logging)?;
    info!(
        engine = ?settings.database.engine()?,
        provider = ?settings.price_source.provider,
        interval_seconds = settings.sampler.interval_seconds,
        retry_delay_seconds = settings.sampler.retry_delay_seconds,
        "Starting price monitor"
    );

    let pool = establish_connection(&settings.database).await?;
    run_migrations(&pool).await?;
    let store = price_store_for(&pool);

    let price_source = build_price_source(&settings.price_source)?;
    let metrics = SamplerMetrics::new()?;

    let sampler = PriceSampler::new(price_source.clone(), store.clone(), &settings)
        .with_metrics(metrics.clone());
    let sampler_handle = tokio::spawn(sampler.run());

    let state = AppState {
        store,
        market: Arc::new(MarketInfoService::new(price_source, &settings)?),
        news: Arc::new(NewsClient::new(&settings.news)?),
        metrics,
        settings: Arc::new(settings.clone()),
    };
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.api.host, settings.api.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Web server error: {}", e);
        }
    });

    tokio::select! {
        _ = sampler_handle => {
            error!("Price sampler stopped unexpectedly");
        }
        _ = server_handle => {
            error!("Web server stopped unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    pool.close().await;
    info!("Shutting down price monitor");
    Ok(())
}
