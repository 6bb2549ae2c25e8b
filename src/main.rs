mod bot;
mod config;
mod dispatcher;
mod handlers;
mod media;
mod platform;
mod poller;
mod storage;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::Bot;
use crate::config::Config;
use crate::handlers::Handlers;
use crate::media::faces::SeetaFaceDetector;
use crate::media::ffmpeg::FfmpegConverter;
use crate::platform::telegram::TelegramApi;
use crate::poller::Poller;
use crate::storage::MediaStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mediabot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  API: {}", config.telegram.api_url);
    info!("  Storage: {}", config.storage.root.display());
    info!("  Face model: {}", config.faces.model_path.display());
    info!("  Poll timeout: {}s", config.polling.timeout_secs);

    let token = config.bot_token()?;
    let api = TelegramApi::new(&config.telegram.api_url, &token, config.polling.timeout_secs)?;

    let me = api.get_me().await.context("Failed to validate bot token")?;
    info!(
        "Authorized as @{} ({})",
        me.username.as_deref().unwrap_or(&me.first_name),
        me.id
    );

    let handlers = Handlers {
        api: Arc::new(api),
        store: MediaStore::new(&config.storage),
        faces: Arc::new(SeetaFaceDetector::new(&config.faces)?),
        audio: Arc::new(FfmpegConverter::new(&config.audio)),
    };
    let poller = Poller::new(
        config.polling.timeout_secs,
        config.polling.offset_file.clone(),
    )?;

    info!("Bot is starting...");
    bot::run(Bot::new(poller, handlers)).await?;

    Ok(())
}
