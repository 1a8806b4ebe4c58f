use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// Raw reply from the completion API. Status and body are interpreted by the
/// comparison service, not by the transport.
#[derive(Debug, Clone)]
pub struct CompletionReply {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl CompletionReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 外部 chat-completion API 的抽象，一次呼叫只送一個請求
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends `messages` once. Transport failures come back as `InternalError`;
    /// any HTTP status, success or not, comes back as a `CompletionReply`.
    async fn send(&self, messages: Vec<ChatMessage>) -> Result<CompletionReply>;

    fn model(&self) -> &str;
}
