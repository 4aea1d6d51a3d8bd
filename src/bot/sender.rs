use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

/// Formatting mode Telegram applies to outgoing text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    #[default]
    #[serde(rename = "HTML")]
    Html,
    Markdown,
    MarkdownV2,
}

/// Result of a `sendMessage` call. Failures are values, never errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Error reported when no bot token is configured.
pub const MISSING_TOKEN: &str = "Bot token not configured";

impl SendOutcome {
    fn sent(message_id: i32) -> Self {
        Self {
            success: true,
            message_id: Some(message_id),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<ParseMode>,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    result: Option<SentMessage>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i32,
}

/// Posts replies straight to the Bot API `sendMessage` method.
pub struct TelegramSender {
    client: Client,
    api_url: String,
    token: Option<String>,
}

impl TelegramSender {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_endpoint(&config.telegram_api_url, config.telegram_bot_token.clone())
    }

    pub fn with_endpoint(api_url: &str, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub async fn send_message(&self, chat_id: i64, text: &str, parse_mode: ParseMode) -> SendOutcome {
        self.send(chat_id, text, Some(parse_mode)).await
    }

    /// Sends `text` verbatim, with no entity parsing.
    pub async fn send_plain(&self, chat_id: i64, text: &str) -> SendOutcome {
        self.send(chat_id, text, None).await
    }

    async fn send(&self, chat_id: i64, text: &str, parse_mode: Option<ParseMode>) -> SendOutcome {
        tracing::info!("Sending message to chat {} ({} chars)", chat_id, text.len());

        let Some(token) = &self.token else {
            tracing::error!("TELEGRAM_BOT_TOKEN is not configured");
            return SendOutcome::failed(MISSING_TOKEN);
        };

        match self.post(token, chat_id, text, parse_mode).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("sendMessage to chat {} failed: {}", chat_id, e);
                SendOutcome::failed(e.to_string())
            }
        }
    }

    async fn post(
        &self,
        token: &str,
        chat_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> anyhow::Result<SendOutcome> {
        let body = SendMessageRequest {
            chat_id,
            text,
            parse_mode,
        };

        // Rejections come back as non-2xx with an `ok: false` body, so the status is not checked.
        let resp: TelegramResponse = self
            .client
            .post(format!("{}/bot{}/sendMessage", self.api_url, token))
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        match (resp.ok, resp.result) {
            (true, Some(sent)) => {
                tracing::info!("Message {} delivered to chat {}", sent.message_id, chat_id);
                Ok(SendOutcome::sent(sent.message_id))
            }
            _ => {
                let description = resp
                    .description
                    .unwrap_or_else(|| "Telegram rejected the message".to_string());
                tracing::error!("Telegram API error for chat {}: {}", chat_id, description);
                Ok(SendOutcome::failed(description))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_html_by_default_and_returns_message_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTEST/sendMessage"))
            .and(body_json(serde_json::json!({
                "chat_id": 42,
                "text": "<b>hi</b>",
                "parse_mode": "HTML",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": { "message_id": 777, "chat": { "id": 42 } },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sender = TelegramSender::with_endpoint(&server.uri(), Some("TEST".into()));
        let outcome = sender.send_message(42, "<b>hi</b>", ParseMode::default()).await;

        assert_eq!(outcome, SendOutcome::sent(777));
    }

    #[tokio::test]
    async fn api_rejection_carries_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found",
            })))
            .mount(&server)
            .await;

        let sender = TelegramSender::with_endpoint(&server.uri(), Some("TEST".into()));
        let outcome = sender.send_message(1, "hello", ParseMode::MarkdownV2).await;

        assert_eq!(outcome, SendOutcome::failed("Bad Request: chat not found"));
    }

    #[tokio::test]
    async fn missing_token_fails_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let sender = TelegramSender::with_endpoint(&server.uri(), None);
        let outcome = sender.send_message(1, "hello", ParseMode::Html).await;

        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some(MISSING_TOKEN));
    }

    #[tokio::test]
    async fn network_failure_is_a_failed_outcome() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let sender = TelegramSender::with_endpoint(&uri, Some("TEST".into()));
        let outcome = sender.send_message(1, "hello", ParseMode::Html).await;

        assert!(!outcome.success);
        assert!(outcome.message_id.is_none());
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn plain_send_omits_parse_mode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTEST/sendMessage"))
            .and(body_json(serde_json::json!({ "chat_id": 9, "text": "a < b" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": { "message_id": 3 },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sender = TelegramSender::with_endpoint(&server.uri(), Some("TEST".into()));
        assert_eq!(sender.send_plain(9, "a < b").await, SendOutcome::sent(3));
    }

    #[test]
    fn outcome_omits_absent_fields() {
        let json = serde_json::to_value(SendOutcome::sent(5)).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "messageId": 5 }));
    }
}
