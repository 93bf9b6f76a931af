use anyhow::Context;
use std::sync::Arc;

use yt_audio_server::routes::create_app;
use yt_audio_server::utils::logging;
use yt_audio_server::{AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let config = AppConfig::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let bind_addr = config.server.bind_addr();
    let state = Arc::new(AppState::new(config)?);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;

    tracing::info!(
        "{} v{} listening on http://{}",
        yt_audio_server::NAME,
        yt_audio_server::VERSION,
        bind_addr
    );

    axum::serve(listener, app).await?;

    Ok(())
}
