//! Client for the remote chat endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::attachment::Attachment;
use crate::error::{Error, Result};

const SEND_FALLBACK_ERROR: &str = "Failed to send message";
const CLEAR_FALLBACK_ERROR: &str = "Failed to clear chat";

/// Body of `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Attachment>,
}

/// Successful answer from `POST /api/chat`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub detected_script: Option<String>,
    #[serde(default)]
    pub history_length: Option<u64>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// The two calls the session controller makes against the backend.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send_chat(&self, request: ChatRequest) -> Result<ChatReply>;

    /// Ask the server to forget the conversation history.
    async fn clear_history(&self) -> Result<()>;
}

#[derive(Clone, Debug)]
pub struct HttpChatClient {
    client: Client,
    base_url: String,
}

impl HttpChatClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ChatApi for HttpChatClient {
    async fn send_chat(&self, request: ChatRequest) -> Result<ChatReply> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| SEND_FALLBACK_ERROR.to_string());
            tracing::warn!(%status, %message, "chat request rejected");
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: ChatReply = response.json().await?;
        Ok(reply)
    }

    async fn clear_history(&self) -> Result<()> {
        let url = format!("{}/api/chat/clear", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: CLEAR_FALLBACK_ERROR.to_string(),
            });
        }

        // Body content is not used, but it must be JSON.
        let _: serde_json::Value = response.json().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_without_image_omits_field() {
        let request = ChatRequest {
            message: "Hello".to_string(),
            image: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, serde_json::json!({ "message": "Hello" }));
    }

    #[test]
    fn test_reply_optional_fields() {
        let reply: ChatReply = serde_json::from_str(r#"{"response":"ok"}"#).unwrap();
        assert_eq!(reply.detected_script, None);
        assert_eq!(reply.history_length, None);

        let reply: ChatReply = serde_json::from_str(
            r#"{"response":"**Hi**","detected_script":"latin","history_length":3}"#,
        )
        .unwrap();
        assert_eq!(reply.detected_script.as_deref(), Some("latin"));
        assert_eq!(reply.history_length, Some(3));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = HttpChatClient::new("http://localhost:5000/");
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}
