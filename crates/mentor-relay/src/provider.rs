//! Upstream assistant provider abstraction.
//!
//! The relay only needs five calls from an assistants-style API: create a
//! thread, append a user message, start a run, read a run back, and list a
//! thread's messages. [`AssistantProvider`] captures exactly that, with
//! [`MockProvider`] as a scripted in-memory implementation for tests and
//! local development without credentials.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// =============================================================================
// Upstream types
// =============================================================================

/// A thread as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpstreamThread {
    pub id: String,
    #[serde(default)]
    pub created_at: i64,
}

/// Status of a run as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Incomplete,
    Completed,
    Failed,
    Cancelled,
    Expired,
    /// Any status this relay does not know about. Polling continues.
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Terminal success.
    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }

    /// Terminal failure.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired
        )
    }

    pub fn is_terminal(&self) -> bool {
        self.is_completed() || self.is_failure()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Expired => "expired",
            RunStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure detail attached to a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunLastError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A run: one execution of the assistant over a thread.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunLastError>,
}

impl Run {
    /// The provider's failure message, if it reported one.
    pub fn failure_reason(&self) -> Option<&str> {
        self.last_error
            .as_ref()
            .and_then(|e| e.message.as_deref())
            .filter(|m| !m.is_empty())
    }
}

/// A message stored in an upstream thread.
///
/// `content` holds the raw content parts so the diagnostic listing can pass
/// them through unchanged.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub content: Vec<serde_json::Value>,
    #[serde(default)]
    pub created_at: i64,
}

impl ThreadMessage {
    pub fn is_assistant(&self) -> bool {
        self.role == "assistant"
    }

    /// Text of the first `text` content part. Blank text counts as none.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|part| part.get("type").and_then(|t| t.as_str()) == Some("text"))
            .and_then(|part| part.pointer("/text/value"))
            .and_then(|v| v.as_str())
            .filter(|t| !t.trim().is_empty())
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Failures talking to the provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Transport(String),
    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unexpected provider response: {0}")]
    Decode(String),
}

// =============================================================================
// Trait
// =============================================================================

/// Client for an assistants-style conversational API.
#[async_trait]
pub trait AssistantProvider: Send + Sync {
    /// Allocate a new conversation thread.
    async fn create_thread(&self) -> Result<UpstreamThread, ProviderError>;

    /// Append a user-authored message to a thread.
    async fn add_user_message(&self, thread_id: &str, content: &str)
        -> Result<(), ProviderError>;

    /// Start the configured assistant over a thread.
    async fn create_run(&self, thread_id: &str) -> Result<Run, ProviderError>;

    /// Read the current state of a run.
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ProviderError>;

    /// List a thread's messages, newest first.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ProviderError>;
}

// =============================================================================
// Mock implementation
// =============================================================================

/// What the mock assistant writes into the thread when a run completes.
#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    NonText,
    Nothing,
}

#[derive(Debug)]
struct MockState {
    statuses: VecDeque<RunStatus>,
    failure_reason: Option<String>,
    reply: MockReply,
    thread_error: Option<String>,
    threads: HashMap<String, Vec<ThreadMessage>>,
    next_id: u64,
}

/// Scripted in-memory provider.
///
/// `retrieve_run` replays the configured status sequence and reports
/// `completed` once it runs out. Every trait call is counted so tests can
/// assert that nothing reached the provider.
#[derive(Debug)]
pub struct MockProvider {
    state: Mutex<MockState>,
    calls: AtomicUsize,
    status_checks: AtomicUsize,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                statuses: VecDeque::new(),
                failure_reason: None,
                reply: MockReply::Text("Olá! Como posso ajudar?".to_string()),
                thread_error: None,
                threads: HashMap::new(),
                next_id: 1,
            }),
            calls: AtomicUsize::new(0),
            status_checks: AtomicUsize::new(0),
        }
    }

    /// Statuses returned by successive `retrieve_run` calls.
    pub fn with_statuses(self, statuses: impl IntoIterator<Item = RunStatus>) -> Self {
        self.lock().statuses = statuses.into_iter().collect();
        self
    }

    /// Reason attached to failed runs.
    pub fn with_failure_reason(self, reason: impl Into<String>) -> Self {
        self.lock().failure_reason = Some(reason.into());
        self
    }

    /// Text the assistant replies with.
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.lock().reply = MockReply::Text(text.into());
        self
    }

    /// Completed runs leave no assistant message behind.
    pub fn without_assistant_reply(self) -> Self {
        self.lock().reply = MockReply::Nothing;
        self
    }

    /// Completed runs leave an assistant message with no text part.
    pub fn with_non_text_reply(self) -> Self {
        self.lock().reply = MockReply::NonText;
        self
    }

    /// `create_thread` fails with the given message.
    pub fn failing_threads(self, message: impl Into<String>) -> Self {
        self.lock().thread_error = Some(message.into());
        self
    }

    /// Total number of provider calls made.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of `retrieve_run` calls made.
    pub fn status_checks(&self) -> usize {
        self.status_checks.load(Ordering::SeqCst)
    }

    /// Messages currently stored for a thread, oldest first.
    pub fn thread_messages(&self, thread_id: &str) -> Vec<ThreadMessage> {
        self.lock()
            .threads
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        let id = format!("{}_{}", prefix, self.next_id);
        self.next_id += 1;
        id
    }

    fn push_message(&mut self, thread_id: &str, role: &str, content: Vec<serde_json::Value>) {
        let id = self.next_id("msg");
        let created_at = self.next_id as i64;
        self.threads
            .entry(thread_id.to_string())
            .or_default()
            .push(ThreadMessage {
                id,
                role: role.to_string(),
                content,
                created_at,
            });
    }
}

fn text_part(text: &str) -> serde_json::Value {
    serde_json::json!({"type": "text", "text": {"value": text, "annotations": []}})
}

#[async_trait]
impl AssistantProvider for MockProvider {
    async fn create_thread(&self) -> Result<UpstreamThread, ProviderError> {
        self.count();
        let mut state = self.lock();
        if let Some(message) = state.thread_error.clone() {
            return Err(ProviderError::Api {
                status: 500,
                message,
            });
        }
        let id = state.next_id("thread");
        state.threads.insert(id.clone(), Vec::new());
        Ok(UpstreamThread {
            id,
            created_at: 1_700_000_000,
        })
    }

    async fn add_user_message(
        &self,
        thread_id: &str,
        content: &str,
    ) -> Result<(), ProviderError> {
        self.count();
        self.lock()
            .push_message(thread_id, "user", vec![text_part(content)]);
        Ok(())
    }

    async fn create_run(&self, _thread_id: &str) -> Result<Run, ProviderError> {
        self.count();
        let id = self.lock().next_id("run");
        Ok(Run {
            id,
            status: RunStatus::Queued,
            last_error: None,
        })
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ProviderError> {
        self.count();
        self.status_checks.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        let status = state.statuses.pop_front().unwrap_or(RunStatus::Completed);

        if status.is_completed() {
            match state.reply.clone() {
                MockReply::Text(text) => {
                    state.push_message(thread_id, "assistant", vec![text_part(&text)])
                }
                MockReply::NonText => state.push_message(
                    thread_id,
                    "assistant",
                    vec![serde_json::json!({
                        "type": "image_file",
                        "image_file": {"file_id": "file_1"}
                    })],
                ),
                MockReply::Nothing => {}
            }
        }

        let last_error = if status.is_failure() {
            state.failure_reason.clone().map(|message| RunLastError {
                code: Some("server_error".to_string()),
                message: Some(message),
            })
        } else {
            None
        };

        Ok(Run {
            id: run_id.to_string(),
            status,
            last_error,
        })
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ProviderError> {
        self.count();
        let mut messages = self.thread_messages(thread_id);
        messages.reverse();
        Ok(messages)
    }
}
