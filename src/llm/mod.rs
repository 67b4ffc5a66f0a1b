//! Reqwest-based client for the Anthropic Messages API.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;

const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub model: String,
    pub max_tokens: u32,
}

impl ChatOptions {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            model: cfg
                .get("CHAT_MODEL")
                .unwrap_or_else(|| "claude-3-5-sonnet-20241022".into()),
            max_tokens: cfg
                .get_u64("CHAT_MAX_TOKENS")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(2048),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl LlmClient {
    /// Build a client from the startup config. Fails when no API key is set.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let api_key = cfg.api_key().ok_or_else(|| {
            anyhow!("Missing ANTHROPIC_API_KEY. Set it in env or ~/.config/leanpad/.leanpadrc")
        })?;
        let base_url = cfg
            .get("ANTHROPIC_BASE_URL")
            .unwrap_or_else(|| "https://api.anthropic.com".into());
        Self::new(base_url, api_key, cfg.request_timeout())
    }

    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Send one non-streaming request and return the first text block.
    pub async fn complete(
        &self,
        system: &str,
        messages: &[ChatMessage],
        opts: &ChatOptions,
    ) -> Result<String> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key).context("API key is not a valid header value")?,
        );

        let body = serde_json::json!({
            "model": opts.model,
            "max_tokens": opts.max_tokens,
            "system": system,
            "messages": messages,
        });

        let resp = self
            .http
            .post(url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .context("failed to send chat request")?;

        match resp.status() {
            StatusCode::OK => {
                let parsed: MessagesResponse = resp.json().await.context("invalid chat response")?;
                parsed
                    .content
                    .into_iter()
                    .find(|block| block.r#type == "text")
                    .and_then(|block| block.text)
                    .ok_or_else(|| anyhow!("chat response contained no text"))
            }
            status => {
                let text = resp.text().await.unwrap_or_default();
                bail!("LLM error: {} - {}", status, text)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    r#type: String,
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_refuses_to_build() {
        assert!(LlmClient::from_config(&Config::defaults()).is_err());
        let cfg = Config::defaults().with_override("ANTHROPIC_API_KEY", "sk-test");
        assert!(LlmClient::from_config(&cfg).is_ok());
    }

    #[test]
    fn options_fall_back_on_bad_numbers() {
        let cfg = Config::defaults().with_override("CHAT_MAX_TOKENS", "lots");
        let opts = ChatOptions::from_config(&cfg);
        assert_eq!(opts.max_tokens, 2048);
        assert_eq!(opts.model, "claude-3-5-sonnet-20241022");
    }

    #[test]
    fn user_messages_serialize_lowercase() -> anyhow::Result<()> {
        let v = serde_json::to_value(ChatMessage::new(Role::User, "hi"))?;
        assert_eq!(v, serde_json::json!({ "role": "user", "content": "hi" }));
        Ok(())
    }
}
