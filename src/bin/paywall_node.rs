use anyhow::Context;
use paywall_bridge::{
    api,
    state::{ApiState, Settings},
    storage::Storage,
    utils::constants::DEFAULT_CONFIG_PATH,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_spec = std::env::var("PAYWALL_LOG").unwrap_or_else(|_| "info".to_string());
    let _logger = paywall_bridge::init_logger(&log_spec)?;
    log::info!("Starting Paywall Node...");

    let config_path =
        std::env::var("PAYWALL_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let settings = Settings::load(&config_path);
    log::info!(
        "Using chain API {} and contract {}",
        settings.api_url,
        settings.paywall_contract
    );

    let storage = Arc::new(
        Storage::open(&settings.db_path)
            .with_context(|| format!("opening database {}", settings.db_path))?,
    );

    let addr: SocketAddr = settings
        .listen_addr
        .parse()
        .with_context(|| format!("invalid listen address {}", settings.listen_addr))?;
    let state = Arc::new(ApiState::new(settings, storage)?);
    let app = api::router(state);

    log::info!("Paywall API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
