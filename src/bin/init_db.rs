//! Creates the schema in the configured database and exits.

use price_monitor::{
    config::Settings,
    database::{establish_connection, run_migrations},
    utils::init_tracing,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let settings = Settings::new()?;
    init_tracing(&settings.logging)?;

    let pool = establish_connection(&settings.database).await?;
    run_migrations(&pool).await?;
    pool.close().await;

    info!(engine = ?settings.database.engine()?, "Database initialised");
    Ok(())
}
