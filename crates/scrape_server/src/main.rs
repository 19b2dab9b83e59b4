use anyhow::{Context, Result};
use scrape_logging::scrape_info;
use scrape_server::{build_router, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    scrape_logging::initialize(config.log_destination, config.log_level);
    scrape_info!("Starting post scraper (provider {})", config.provider_base_url);

    let state = AppState::from_config(&config)?;
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    scrape_info!("Server running at http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
