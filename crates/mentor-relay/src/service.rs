//! The relay's operations, independent of HTTP.
//!
//! `RelayService` owns the provider handle, the thread registry and the run
//! poller. Each call is a straight sequence of provider requests; nothing is
//! retried.

use std::sync::Arc;

use mentor_core::types::{
    MessageListResponse, MessageReply, MessageSummary, SendMessageRequest, ThreadCreated,
};

use crate::error::RelayError;
use crate::poll::RunPoller;
use crate::provider::AssistantProvider;
use crate::registry::ThreadRegistry;

const MISSING_FIELDS: &str = "threadId and content are required";

/// Bridges client requests to the upstream provider.
pub struct RelayService {
    provider: Arc<dyn AssistantProvider>,
    registry: ThreadRegistry,
    poller: RunPoller,
}

impl RelayService {
    pub fn new(provider: Arc<dyn AssistantProvider>, poller: RunPoller) -> Self {
        Self {
            provider,
            registry: ThreadRegistry::new(),
            poller,
        }
    }

    pub fn registry(&self) -> &ThreadRegistry {
        &self.registry
    }

    pub fn poller(&self) -> &RunPoller {
        &self.poller
    }

    /// Allocate a new upstream thread and start tracking it.
    pub async fn create_conversation(&self) -> Result<ThreadCreated, RelayError> {
        let thread = self.provider.create_thread().await?;
        self.registry.register(&thread.id);
        tracing::info!(thread_id = %thread.id, "Thread created");

        Ok(ThreadCreated {
            id: thread.id,
            created_at: thread.created_at,
        })
    }

    /// Submit a user message and wait for the assistant's reply.
    pub async fn send_message(&self, req: SendMessageRequest) -> Result<MessageReply, RelayError> {
        let (thread_id, content) = validate(req)?;

        self.provider.add_user_message(&thread_id, &content).await?;
        tracing::info!(
            thread_id = %thread_id,
            chars = content.chars().count(),
            "Message added to thread"
        );

        let run = self.provider.create_run(&thread_id).await?;
        tracing::info!(thread_id = %thread_id, run_id = %run.id, "Run created");

        self.poller
            .wait_for_completion(self.provider.as_ref(), &thread_id, &run.id)
            .await?;

        let messages = self.provider.list_messages(&thread_id).await?;
        let assistant = messages
            .iter()
            .find(|m| m.is_assistant())
            .ok_or(RelayError::NoAssistantMessage)?;
        let text = assistant.text().ok_or(RelayError::NoTextContent)?;

        if !self.registry.record_reply(&thread_id) {
            tracing::debug!(thread_id = %thread_id, "Reply on an untracked thread");
        }
        tracing::info!(
            thread_id = %thread_id,
            message_id = %assistant.id,
            "Assistant reply relayed"
        );

        Ok(MessageReply {
            message: text.to_string(),
            message_id: assistant.id.clone(),
            thread_id,
        })
    }

    /// Raw message listing for a thread.
    pub async fn list_messages(&self, thread_id: &str) -> Result<MessageListResponse, RelayError> {
        let messages = self.provider.list_messages(thread_id).await?;
        Ok(MessageListResponse {
            messages: messages
                .into_iter()
                .map(|m| MessageSummary {
                    id: m.id,
                    role: m.role,
                    content: serde_json::Value::Array(m.content),
                    created_at: m.created_at,
                })
                .collect(),
        })
    }
}

/// Require a thread id and non-blank content.
fn validate(req: SendMessageRequest) -> Result<(String, String), RelayError> {
    let thread_id = req
        .thread_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| RelayError::Validation(MISSING_FIELDS.to_string()))?;
    let content = req
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| RelayError::Validation(MISSING_FIELDS.to_string()))?;
    Ok((thread_id, content))
}
