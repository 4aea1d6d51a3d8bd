//! The per-message pipeline: agent reply first, Telegram delivery second.

use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::agent::UserCheckAgent;
use crate::bot::sender::{ParseMode, TelegramSender, MISSING_TOKEN};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowInput {
    pub message: String,
    pub chat_id: i64,
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentReply {
    pub agent_response: String,
    pub chat_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowOutput {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i32>,
}

pub struct UserCheckWorkflow<'a> {
    agent: &'a UserCheckAgent,
    sender: &'a TelegramSender,
}

impl<'a> UserCheckWorkflow<'a> {
    pub fn new(agent: &'a UserCheckAgent, sender: &'a TelegramSender) -> Self {
        Self { agent, sender }
    }

    /// Step 1: let the agent answer the message.
    pub async fn process_with_agent(&self, input: &WorkflowInput) -> anyhow::Result<AgentReply> {
        tracing::info!(
            "Processing message from chat {} ({}): {}",
            input.chat_id,
            input.user_name.as_deref().unwrap_or("anonymous"),
            input.message
        );
        let agent_response = self.agent.respond(&input.message).await?;
        tracing::info!("Agent replied with {} chars", agent_response.len());
        Ok(AgentReply {
            agent_response,
            chat_id: input.chat_id,
        })
    }

    /// Step 2: deliver the reply as HTML, falling back to plain text if Telegram rejects it.
    pub async fn send_to_telegram(&self, reply: &AgentReply) -> WorkflowOutput {
        let mut outcome = self
            .sender
            .send_message(reply.chat_id, &reply.agent_response, ParseMode::Html)
            .await;
        if !outcome.success && outcome.error.as_deref() != Some(MISSING_TOKEN) {
            tracing::warn!(
                "HTML reply to chat {} rejected ({:?}), resending as plain text",
                reply.chat_id,
                outcome.error
            );
            outcome = self
                .sender
                .send_plain(reply.chat_id, &reply.agent_response)
                .await;
        }
        tracing::info!("Delivery to chat {}: {:?}", reply.chat_id, outcome);
        WorkflowOutput {
            success: outcome.success,
            message_id: outcome.message_id,
        }
    }

    pub async fn run(&self, input: WorkflowInput) -> anyhow::Result<WorkflowOutput> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("user_check_workflow", %run_id, chat_id = input.chat_id);

        async {
            let reply = self.process_with_agent(&input).await?;
            Ok::<_, anyhow::Error>(self.send_to_telegram(&reply).await)
        }
        .instrument(span)
        .await
    }
}
