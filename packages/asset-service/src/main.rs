//! Provisioning entry point.
//!
//! Creates the schema, indexes, buckets and scratch directory described by
//! the configuration, checks that both stores answer, and exits. Servers
//! embed [`asset_service::AssetService`] behind their own transport.

use asset_service::config::AppConfig;
use asset_service::state::AppState;
use asset_service::telemetry::init_tracing;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load()?;
    let state = AppState::init(config).await?;
    state.check_health().await?;
    info!("Schema, indexes and buckets are ready");

    state.shutdown().await?;
    Ok(())
}
