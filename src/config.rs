use std::str::FromStr;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Needed by the dispatcher; the outbound sender reports its absence as a failed send.
    pub telegram_bot_token: Option<String>,
    pub telegram_api_url: String,
    pub database_url: String,
    pub database_max_connections: u32,

    /// OpenAI-compatible chat completions endpoint
    pub llm_base_url: String,
    pub llm_api_key: String,
    pub llm_model: String,

    /// Row cap for `/list` and the list tool when no limit is given
    pub list_default_limit: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            telegram_api_url: std::env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| "https://api.telegram.org".to_string()),
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL is not set"))?,
            database_max_connections: positive_or(
                "DATABASE_MAX_CONNECTIONS",
                std::env::var("DATABASE_MAX_CONNECTIONS").ok().as_deref(),
                5,
            ),
            llm_base_url: std::env::var("AI_INTEGRATIONS_OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            llm_api_key: std::env::var("AI_INTEGRATIONS_OPENAI_API_KEY")
                .map_err(|_| anyhow::anyhow!("AI_INTEGRATIONS_OPENAI_API_KEY is not set"))?,
            llm_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            list_default_limit: positive_or(
                "LIST_DEFAULT_LIMIT",
                std::env::var("LIST_DEFAULT_LIMIT").ok().as_deref(),
                50,
            ),
        })
    }
}

/// Parses a count that must be at least 1; anything else falls back to `default`.
fn positive_or<T>(name: &str, raw: Option<&str>, default: T) -> T
where
    T: FromStr + PartialOrd + Default + std::fmt::Display,
{
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => value,
        _ => {
            tracing::warn!("{} must be a positive number, got {:?}; using {}", name, raw, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_must_be_positive() {
        assert_eq!(positive_or("LIST_DEFAULT_LIMIT", Some("20"), 50i64), 20);
        assert_eq!(positive_or("LIST_DEFAULT_LIMIT", Some("0"), 50i64), 50);
        assert_eq!(positive_or("LIST_DEFAULT_LIMIT", Some("-3"), 50i64), 50);
        assert_eq!(positive_or("LIST_DEFAULT_LIMIT", None, 50i64), 50);
        assert_eq!(positive_or("DATABASE_MAX_CONNECTIONS", Some("0"), 5u32), 5);
        assert_eq!(positive_or("DATABASE_MAX_CONNECTIONS", Some("many"), 5u32), 5);
        assert_eq!(positive_or("DATABASE_MAX_CONNECTIONS", Some(" 8 "), 5u32), 8);
    }
}
