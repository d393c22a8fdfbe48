//! Runs a single sampling cycle against the configured source and store.
//! Exits non-zero if the cycle fails; there is no retry.

use price_monitor::{
    config::Settings,
    database::{establish_connection, price_store_for, run_migrations},
    services::{build_price_source, PriceSampler},
    utils::init_tracing,
};
use std::process::ExitCode;
use tracing::error;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let settings = Settings::new()?;
    init_tracing(&settings.logging)?;

    let pool = establish_connection(&settings.database).await?;
    run_migrations(&pool).await?;

    let sampler = PriceSampler::new(
        build_price_source(&settings.price_source)?,
        price_store_for(&pool),
        &settings,
    );
    let outcome = sampler.sample_once().await;
    pool.close().await;

    match outcome {
        Ok(sample) => {
            println!("{}", serde_json::to_string_pretty(&sample)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(error = %e, "Sampling failed");
            Ok(ExitCode::FAILURE)
        }
    }
}
