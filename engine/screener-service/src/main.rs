use screener_service::{ScreenerConfig, ScreenerService};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting Market Screener Service");

    // Load configuration
    let config = ScreenerConfig::from_env();
    info!("Loaded configuration: {:?}", config);

    // Create and start the service
    let mut service = ScreenerService::new(config)?;
    service.start().await?;

    // Run until interrupted
    tokio::signal::ctrl_c().await?;
    service.teardown().await;

    Ok(())
}
