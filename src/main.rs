use std::sync::Arc;

use teloxide::prelude::*;
use tracing_subscriber::EnvFilter;

mod agent;
mod ai;
mod bot;
mod config;
mod db;
mod directory;
mod workflow;

use agent::UserCheckAgent;
use ai::llm::LlmClient;
use bot::sender::TelegramSender;
use config::AppConfig;
use db::Database;
use directory::Reconciler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("📇 Starting user directory bot...");

    // Load config
    let config = AppConfig::from_env()?;
    let token = config
        .telegram_bot_token
        .clone()
        .ok_or_else(|| anyhow::anyhow!("TELEGRAM_BOT_TOKEN is not set"))?;

    // Initialize database
    let db = Database::connect(&config.database_url, config.database_max_connections).await?;
    db.run_migrations().await?;
    tracing::info!(
        "Database connected (pool of {}) and migrations applied.",
        config.database_max_connections
    );

    let directory = Reconciler::new(Arc::new(db.clone()), config.list_default_limit);
    let llm = LlmClient::new(&config);
    tracing::info!("Config loaded. Model: {}", llm.model());

    // Build shared application state
    let state = Arc::new(bot::AppState {
        config: config.clone(),
        db,
        directory: directory.clone(),
        agent: UserCheckAgent::new(llm, directory),
        sender: TelegramSender::new(&config),
    });

    // Create the Telegram bot
    let bot = Bot::new(token);

    // Build the dispatcher
    let handler = bot::build_handler();

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state.clone()])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    state.db.close().await;
    tracing::info!("Database pool closed. Bye.");

    Ok(())
}
