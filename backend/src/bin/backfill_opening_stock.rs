//! fdm-backfill: one-shot operator tool that rebuilds every shift's
//! opening-stock snapshot by walking the shift chain per store.
//!
//! Run: cargo run --bin fdm-backfill

use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fdm_backend::services::ShiftChainService;
use fdm_backend::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fdm_backfill=info,fdm_backend=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::load()?;

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    let service = ShiftChainService::new(db_pool);
    let summary = service.backfill_opening_stock().await?;

    tracing::info!(
        processed = summary.shifts_processed,
        updated = summary.shifts_updated,
        skipped = summary.shifts_skipped,
        "Backfill complete"
    );

    Ok(())
}
