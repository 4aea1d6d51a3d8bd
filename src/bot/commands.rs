use std::sync::Arc;
use teloxide::utils::command::BotCommands;
use teloxide::prelude::*;

use crate::bot::handlers::APOLOGY;
use crate::bot::AppState;
use crate::db::StoreError;
use crate::directory::ListOutcome;

/// Commands answered straight from the directory. Anything else goes through the agent.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Доступні команди:")]
pub enum BotCommand {
    #[command(description = "привітання та список команд")]
    Start,
    #[command(description = "показати довідку")]
    Help,
    #[command(description = "кількість користувачів у базі")]
    Count,
    #[command(description = "список користувачів")]
    List,
}

const GREETING: &str = "👋 Вітаю! Я бот для роботи з базою користувачів.\n\n\
    📊 /count - кількість користувачів\n\
    📋 /list - список користувачів\n\
    ➕ /add - додати: номер ім'я прізвище\n\
    🗑 /delete - видалити за номером\n\
    ✏️ /edit - змінити дані користувача\n\
    🔍 /check - перевірити номер\n\n\
    Можна також надіслати список номерів, кожен з нового рядка.";

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: BotCommand,
    state: Arc<AppState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let user_id = msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(0);

    match cmd {
        BotCommand::Start => {
            tracing::info!("/start from user {}", user_id);
            bot.send_message(msg.chat.id, GREETING).await?;
        }

        BotCommand::Help => {
            bot.send_message(msg.chat.id, BotCommand::descriptions().to_string())
                .await?;
        }

        BotCommand::Count => {
            let count = state.directory.count().await;
            bot.send_message(msg.chat.id, count_reply(count)).await?;
        }

        BotCommand::List => {
            let listed = state
                .directory
                .list(Some(state.config.list_default_limit))
                .await;
            bot.send_message(msg.chat.id, list_reply(listed)).await?;
        }
    }

    Ok(())
}

fn count_reply(count: Result<i64, StoreError>) -> String {
    match count {
        Ok(count) => format!("📊 Користувачів у базі: {}", count),
        Err(e) => {
            tracing::error!("/count failed: {}", e);
            APOLOGY.to_string()
        }
    }
}

fn list_reply(listed: Result<ListOutcome, StoreError>) -> String {
    match listed {
        Ok(listed) => format_user_list(&listed),
        Err(e) => {
            tracing::error!("/list failed: {}", e);
            APOLOGY.to_string()
        }
    }
}

/// Render a listing as plain text, one user per line.
pub fn format_user_list(listed: &ListOutcome) -> String {
    if listed.users.is_empty() {
        return "📭 База користувачів порожня.".to_string();
    }

    let mut text = format!(
        "📋 Користувачі ({} з {}):\n\n",
        listed.users.len(),
        listed.total
    );
    for (i, user) in listed.users.iter().enumerate() {
        text.push_str(&format!(
            "{}. {} {} {}\n",
            i + 1,
            user.phone,
            user.first_name,
            user.last_name
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UserRecord;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn user(id: i32, phone: &str, first: &str, last: &str) -> UserRecord {
        UserRecord {
            id,
            phone: phone.into(),
            first_name: first.into(),
            last_name: last.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn list_shows_shown_and_total_counts() {
        let listed = ListOutcome {
            users: vec![
                user(3, "+380993333333", "Olena", "Koval"),
                user(2, "+380992222222", "Ivan", "Petrenko"),
            ],
            total: 3,
        };
        assert_eq!(
            format_user_list(&listed),
            "📋 Користувачі (2 з 3):\n\n\
             1. +380993333333 Olena Koval\n\
             2. +380992222222 Ivan Petrenko\n"
        );
    }

    #[test]
    fn store_errors_get_an_apology() {
        assert_eq!(
            count_reply(Err(StoreError::Database(sqlx::Error::PoolTimedOut))),
            APOLOGY
        );
        assert_eq!(
            list_reply(Err(StoreError::Database(sqlx::Error::PoolClosed))),
            APOLOGY
        );
        assert_eq!(count_reply(Ok(4)), "📊 Користувачів у базі: 4");
    }

    #[test]
    fn empty_directory_has_its_own_message() {
        let listed = ListOutcome {
            users: vec![],
            total: 0,
        };
        assert_eq!(format_user_list(&listed), "📭 База користувачів порожня.");
    }
}
