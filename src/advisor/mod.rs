//! Advisory chat: forwards a question plus the editor contents to the LLM.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    llm::{ChatMessage, ChatOptions, LlmClient, Role},
    messages::Messages,
    prompt,
};

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub code: String,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub success: bool,
    pub response: String,
}

#[derive(Debug, Clone)]
pub struct Advisor {
    client: Option<LlmClient>,
    options: ChatOptions,
    messages: Messages,
}

impl Advisor {
    /// `client = None` means no credential was configured; every request then
    /// gets a failure reply instead of an upstream call.
    pub fn new(client: Option<LlmClient>, options: ChatOptions, messages: Messages) -> Self {
        Self {
            client,
            options,
            messages,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub async fn ask(&self, request: &ChatRequest) -> ChatReply {
        let Some(client) = &self.client else {
            return ChatReply {
                success: false,
                response: self.messages.missing_api_key(),
            };
        };

        let locale = self.messages.locale();
        let system = prompt::system_text(locale);
        let user = prompt::user_text(
            locale,
            &request.code,
            &request.message,
            request.context.as_deref(),
        );

        match client
            .complete(&system, &[ChatMessage::new(Role::User, user)], &self.options)
            .await
        {
            Ok(text) => ChatReply {
                success: true,
                response: text,
            },
            Err(e) => {
                warn!(error = %e, "chat request failed");
                ChatReply {
                    success: false,
                    response: self.messages.chat_error(&format!("{:#}", e)),
                }
            }
        }
    }
}
