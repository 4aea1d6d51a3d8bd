pub mod commands;
pub mod handlers;
pub mod sender;

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;

use crate::agent::UserCheckAgent;
use crate::config::AppConfig;
use crate::db::Database;
use crate::directory::Reconciler;
use sender::TelegramSender;

/// Shared application state, accessible from all handlers.
pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
    pub directory: Reconciler,
    pub agent: UserCheckAgent,
    pub sender: TelegramSender,
}

/// Build the teloxide update handler tree.
pub fn build_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    let command_handler = Update::filter_message()
        .filter_command::<commands::BotCommand>()
        .endpoint(commands::handle_command);

    let message_handler = Update::filter_message().endpoint(handlers::handle_message);

    dptree::entry()
        .branch(command_handler)
        .branch(message_handler)
}
