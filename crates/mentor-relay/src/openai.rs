//! OpenAI Assistants (v2) provider over `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use mentor_core::config::ProviderConfig;
use reqwest::{Client, Method, Url};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use serde_json::json;

use crate::provider::{AssistantProvider, ProviderError, Run, ThreadMessage, UpstreamThread};

const BETA_HEADER: &str = "OpenAI-Beta";
const BETA_VALUE: &str = "assistants=v2";

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}

/// Provider backed by the OpenAI Assistants API.
///
/// Holds the credential and assistant id; neither ever leaves the relay.
pub struct OpenAiAssistants {
    client: Client,
    base_url: String,
    api_key: String,
    assistant_id: String,
}

impl OpenAiAssistants {
    pub fn new(config: &ProviderConfig) -> Self {
        OpenAiAssistants {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
                .build()
                .unwrap_or_default(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            assistant_id: config.assistant_id.clone(),
        }
    }

    /// Build an endpoint URL from path segments, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ProviderError::Transport(format!("invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Transport("base URL cannot have a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<T, ProviderError> {
        let mut req = self
            .client
            .request(method, url)
            .bearer_auth(&self.api_key)
            .header(BETA_HEADER, BETA_VALUE);
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v.pointer("/error/message")?.as_str().map(str::to_string))
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            tracing::warn!(status = status.as_u16(), error = %message, "Provider request rejected");
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AssistantProvider for OpenAiAssistants {
    async fn create_thread(&self) -> Result<UpstreamThread, ProviderError> {
        let url = self.url(&["threads"])?;
        self.call(Method::POST, url, Some(json!({}))).await
    }

    async fn add_user_message(
        &self,
        thread_id: &str,
        content: &str,
    ) -> Result<(), ProviderError> {
        let url = self.url(&["threads", thread_id, "messages"])?;
        let _: IgnoredAny = self
            .call(
                Method::POST,
                url,
                Some(json!({"role": "user", "content": content})),
            )
            .await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str) -> Result<Run, ProviderError> {
        let url = self.url(&["threads", thread_id, "runs"])?;
        self.call(
            Method::POST,
            url,
            Some(json!({"assistant_id": self.assistant_id})),
        )
        .await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ProviderError> {
        let url = self.url(&["threads", thread_id, "runs", run_id])?;
        self.call(Method::GET, url, None).await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ProviderError> {
        let mut url = self.url(&["threads", thread_id, "messages"])?;
        url.query_pairs_mut().append_pair("order", "desc");
        let list: MessageList = self.call(Method::GET, url, None).await?;
        Ok(list.data)
    }
}
