pub mod prompt;
pub mod tools;

use crate::ai::llm::{ChatMessage, LlmClient};
use crate::directory::Reconciler;
use tools::ToolRegistry;

/// Tool calls allowed per incoming message before the agent gives up.
const MAX_TOOL_ROUNDS: usize = 5;

/// Routes a free-text operator message to directory tools through the LLM.
pub struct UserCheckAgent {
    llm: LlmClient,
    tools: ToolRegistry,
    directory: Reconciler,
    system_prompt: String,
}

impl UserCheckAgent {
    pub fn new(llm: LlmClient, directory: Reconciler) -> Self {
        let tools = ToolRegistry::new();
        let system_prompt = prompt::build_system_prompt(&tools.describe_for_prompt());
        Self {
            llm,
            tools,
            directory,
            system_prompt,
        }
    }

    /// Produce the reply text for one message, running any tools the model asks for.
    pub async fn respond(&self, message: &str) -> anyhow::Result<String> {
        let mut messages = vec![
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(message),
        ];

        for round in 1..=MAX_TOOL_ROUNDS {
            let response = self.llm.chat(&messages).await?;

            if response.text.trim().is_empty() {
                anyhow::bail!("model returned an empty reply");
            }
            let Some(call) = ToolRegistry::parse_tool_call(&response.text) else {
                return Ok(response.text);
            };
            tracing::info!("Tool call {} (round {}): {:?}", call.name, round, call);

            let result = self.tools.execute(&self.directory, &call).await?;
            messages.push(ChatMessage::assistant(response.text));
            messages.push(ChatMessage::user(format!(
                "[tool {} result]\n{}",
                call.name, result
            )));
        }

        anyhow::bail!("agent did not answer within {} tool rounds", MAX_TOOL_ROUNDS)
    }
}
