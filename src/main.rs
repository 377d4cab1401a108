use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

use lingua_relay::bot::{HistoryStore, MessageRouter, TelegramClient};
use lingua_relay::config::Config;
use lingua_relay::{groq, webhook};

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("lingua-relay.log"))
    {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Failed to open log file in {}: {e}", log_dir.display());
            std::process::exit(1);
        }
    };
    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🚀 Starting lingua-relay...");
    info!("Admin ID: {}", config.admin_id);
    info!("Model: {} ({}s timeout)", config.groq_model, config.completion_timeout.as_secs());

    let history = match HistoryStore::load(&config.history_path()) {
        Ok(history) => history,
        Err(e) => {
            error!("Refusing to start: {e}");
            error!("Move or repair the file, then restart.");
            drop(guard);
            std::process::exit(1);
        }
    };

    let completer = match groq::Client::new(
        config.groq_api_key.clone(),
        config.groq_url.clone(),
        config.groq_model.clone(),
        config.completion_timeout,
    ) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to build HTTP client: {e}");
            drop(guard);
            std::process::exit(1);
        }
    };

    let telegram = Arc::new(TelegramClient::new(Bot::new(&config.telegram_token)));
    let mut router = MessageRouter::new(config.admin_id, history, telegram.clone(), completer);
    match telegram.bot_username().await {
        Ok(username) => {
            info!("Bot username: @{username}");
            router = router.with_bot_username(username);
        }
        Err(e) => warn!("{e}; accepting commands addressed to any bot"),
    }
    let router = Arc::new(router);

    match telegram
        .register_webhook(&config.webhook_endpoint(), config.webhook_secret.as_deref())
        .await
    {
        Ok(()) => info!("🚀 Webhook set to {}", config.webhook_endpoint()),
        Err(e) => warn!("Continuing without webhook registration: {e}"),
    }

    let app = webhook::build_router(router, config.webhook_secret.clone());
    if let Err(e) = webhook::serve(&config.listen_addr(), app).await {
        error!("Server error: {e}");
        drop(guard);
        std::process::exit(1);
    }
}
