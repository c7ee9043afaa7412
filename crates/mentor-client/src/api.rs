//! Client side of the relay HTTP contract.

use std::time::Duration;

use async_trait::async_trait;
use mentor_core::config::ClientConfig;
use mentor_core::types::{
    ErrorEnvelope, HealthResponse, MessageReply, SendMessageRequest, ThreadCreated,
};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ClientError;

/// The three relay calls the conversation client makes.
#[async_trait]
pub trait RelayApi: Send + Sync {
    async fn health(&self) -> Result<HealthResponse, ClientError>;

    async fn create_thread(&self) -> Result<ThreadCreated, ClientError>;

    async fn send_message(&self, thread_id: &str, content: &str)
        -> Result<MessageReply, ClientError>;
}

/// `RelayApi` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRelayApi {
    client: Client,
    base_url: String,
}

impl HttpRelayApi {
    /// `base_url` is the relay's API root, e.g. `http://localhost:3000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Relay chosen by the host the client is served from.
    pub fn for_host(config: &ClientConfig, host: &str) -> Self {
        Self::new(config.api_base_for_host(host))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut req = self.client.request(method, &url);
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            let message = resp
                .json::<ErrorEnvelope>()
                .await
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| "API request failed".to_string());
            return Err(ClientError::Relay(message));
        }

        resp.json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RelayApi for HttpRelayApi {
    async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.request::<_, ()>(Method::GET, "/health", None).await
    }

    async fn create_thread(&self) -> Result<ThreadCreated, ClientError> {
        let created: ThreadCreated = self.request::<_, ()>(Method::POST, "/threads", None).await?;
        tracing::info!(thread_id = %created.id, "Thread created");
        Ok(created)
    }

    async fn send_message(
        &self,
        thread_id: &str,
        content: &str,
    ) -> Result<MessageReply, ClientError> {
        let body = SendMessageRequest {
            thread_id: Some(thread_id.to_string()),
            content: Some(content.to_string()),
        };
        let reply: MessageReply = self.request(Method::POST, "/messages", Some(&body)).await?;
        tracing::debug!(message_id = %reply.message_id, "Response received from assistant");
        Ok(reply)
    }
}
