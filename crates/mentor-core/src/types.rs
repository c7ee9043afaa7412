//! JSON wire types shared by the relay and the conversation client.
//!
//! Field names follow the browser widget's contract (`threadId`,
//! `messageId`) rather than Rust conventions, hence the serde renames.

use serde::{Deserialize, Serialize};

// =============================================================================
// Conversation roles
// =============================================================================

/// Author of a message in a conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in the client-side transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

// =============================================================================
// Relay HTTP bodies
// =============================================================================

/// GET /api/health response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// POST /api/threads response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadCreated {
    pub id: String,
    /// Upstream creation time, unix seconds.
    pub created_at: i64,
}

/// POST /api/messages request body.
///
/// Both fields are optional on the wire so that a missing field is reported
/// through the relay's own validation path instead of a deserializer error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    #[serde(rename = "threadId", default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// POST /api/messages response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReply {
    pub message: String,
    #[serde(rename = "messageId")]
    pub message_id: String,
    #[serde(rename = "threadId")]
    pub thread_id: String,
}

/// One entry of GET /api/threads/{id}/messages.
///
/// `content` is the upstream content-part array, passed through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageSummary {
    pub id: String,
    pub role: String,
    pub content: serde_json::Value,
    pub created_at: i64,
}

/// GET /api/threads/{id}/messages response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageListResponse {
    pub messages: Vec<MessageSummary>,
}

/// Error envelope returned by every failing relay endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorDetail,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_request_uses_camel_case_thread_id() {
        let req: SendMessageRequest =
            serde_json::from_str(r#"{"threadId":"thread_1","content":"oi"}"#).unwrap();
        assert_eq!(req.thread_id.as_deref(), Some("thread_1"));
        assert_eq!(req.content.as_deref(), Some("oi"));
    }

    #[test]
    fn test_send_request_missing_fields_are_none() {
        let req: SendMessageRequest = serde_json::from_str("{}").unwrap();
        assert!(req.thread_id.is_none());
        assert!(req.content.is_none());
    }

    #[test]
    fn test_message_reply_field_names() {
        let reply = MessageReply {
            message: "Olá".to_string(),
            message_id: "msg_1".to_string(),
            thread_id: "thread_1".to_string(),
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["message"], "Olá");
        assert_eq!(json["messageId"], "msg_1");
        assert_eq!(json["threadId"], "thread_1");
    }

    #[test]
    fn test_error_envelope_shape() {
        let json = serde_json::to_value(ErrorEnvelope::new("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"error": {"message": "boom"}}));
    }

    #[test]
    fn test_chat_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ChatRole::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(ChatRole::User.to_string(), "user");
    }
}
