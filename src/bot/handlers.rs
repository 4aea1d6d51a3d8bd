use std::sync::Arc;
use teloxide::prelude::*;

use crate::bot::AppState;
use crate::workflow::{UserCheckWorkflow, WorkflowInput};

pub const APOLOGY: &str = "😔 Не вдалося обробити запит. Спробуйте ще раз пізніше.";

/// Runs every non-command text message through the agent workflow.
pub async fn handle_message(
    bot: Bot,
    msg: Message,
    state: Arc<AppState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let Some(text) = msg.text() else {
        // Unsupported message type
        return Ok(());
    };

    let input = WorkflowInput {
        message: text.to_string(),
        chat_id: msg.chat.id.0,
        user_name: msg.from.as_ref().map(|u| u.full_name()),
    };

    bot.send_chat_action(msg.chat.id, teloxide::types::ChatAction::Typing)
        .await?;

    let workflow = UserCheckWorkflow::new(&state.agent, &state.sender);
    match workflow.run(input).await {
        Ok(output) if !output.success => {
            tracing::warn!("Reply to chat {} was not delivered", msg.chat.id.0);
            bot.send_message(msg.chat.id, APOLOGY).await?;
        }
        Ok(_) => {}
        Err(e) => {
            tracing::error!("Workflow failed for chat {}: {:#}", msg.chat.id.0, e);
            bot.send_message(msg.chat.id, APOLOGY).await?;
        }
    }

    Ok(())
}
