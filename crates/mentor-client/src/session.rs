//! Conversation session state machine.
//!
//! Valid transitions:
//! - Uninitialized -> Loading (initialize)
//! - Loading -> Ready (thread opened)
//! - Loading -> Error (relay unreachable; the session stays here)
//! - Ready -> Sending (message submitted)
//! - Sending -> Ready (reply shown)
//! - Sending -> Error (send failed)
//! - Error -> Ready (after a send failure, once cleanup runs)

use std::fmt;

use mentor_core::types::ChatMessage;

use crate::api::RelayApi;
use crate::error::{ClientError, VoiceError};
use crate::messages::{INIT_FAILED, SEND_FAILED, STARTER_FAILED, VOICE_FAILED, VOICE_UNSUPPORTED};
use crate::view::ChatView;
use crate::voice::{RecognitionEvent, VoiceCapture};

/// Lifecycle state of a chat session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Uninitialized,
    Loading,
    Ready,
    Sending,
    Error,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Uninitialized => write!(f, "Uninitialized"),
            SessionState::Loading => write!(f, "Loading"),
            SessionState::Ready => write!(f, "Ready"),
            SessionState::Sending => write!(f, "Sending"),
            SessionState::Error => write!(f, "Error"),
        }
    }
}

impl SessionState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        matches!(
            (self, target),
            (SessionState::Uninitialized, SessionState::Loading)
                | (SessionState::Loading, SessionState::Ready)
                | (SessionState::Loading, SessionState::Error)
                | (SessionState::Ready, SessionState::Sending)
                | (SessionState::Sending, SessionState::Ready)
                | (SessionState::Sending, SessionState::Error)
                | (SessionState::Error, SessionState::Ready)
        )
    }
}

/// One chat widget: relay calls, view model and voice capture.
pub struct ChatSession<A: RelayApi> {
    api: A,
    state: SessionState,
    thread_id: Option<String>,
    view: ChatView,
    voice: VoiceCapture,
}

impl<A: RelayApi> ChatSession<A> {
    pub fn new(api: A, voice: VoiceCapture) -> Self {
        Self {
            api,
            state: SessionState::Uninitialized,
            thread_id: None,
            view: ChatView::new(),
            voice,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    pub fn view(&self) -> &ChatView {
        &self.view
    }

    /// Mutable view access, for the renderer to write typed input.
    pub fn view_mut(&mut self) -> &mut ChatView {
        &mut self.view
    }

    pub fn voice(&self) -> &VoiceCapture {
        &self.voice
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn transition(&mut self, target: SessionState) -> Result<(), ClientError> {
        // An Error reached during startup has no thread to return to.
        let allowed = self.state.can_transition_to(&target)
            && !(self.state == SessionState::Error && self.thread_id.is_none());
        if !allowed {
            return Err(ClientError::InvalidTransition {
                from: self.state,
                to: target,
            });
        }
        tracing::debug!(from = %self.state, to = %target, "Session transition");
        self.state = target;
        Ok(())
    }

    /// Check the relay, then open a conversation thread.
    ///
    /// On failure the error modal shows and the session stays in `Error`.
    pub async fn initialize(&mut self) -> Result<(), ClientError> {
        self.transition(SessionState::Loading)?;
        self.view.loading = true;

        let opened = self.open_thread().await;
        self.view.loading = false;

        match opened {
            Ok(thread_id) => {
                tracing::info!(thread_id = %thread_id, "Chat initialized");
                self.thread_id = Some(thread_id);
                self.view.start_screen_visible = true;
                self.view.set_input_enabled(true);
                self.transition(SessionState::Ready)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize chat");
                self.view.show_error(INIT_FAILED);
                self.transition(SessionState::Error)?;
                Err(e)
            }
        }
    }

    async fn open_thread(&self) -> Result<String, ClientError> {
        self.api
            .health()
            .await
            .map_err(|e| ClientError::RelayUnreachable(e.to_string()))?;
        let created = self.api.create_thread().await?;
        Ok(created.id)
    }

    /// Send `text` and show the reply. Blank text is ignored and returns
    /// `Ok(None)` without calling the relay.
    pub async fn send_message(&mut self, text: &str) -> Result<Option<String>, ClientError> {
        self.deliver(text, SEND_FAILED).await
    }

    /// Send whatever is in the input field.
    pub async fn send_input(&mut self) -> Result<Option<String>, ClientError> {
        let text = self.view.input.clone();
        self.deliver(&text, SEND_FAILED).await
    }

    /// Reveal the conversation starters.
    pub fn start_chat(&mut self) {
        self.view.starters_visible = true;
    }

    /// Leave the start screen and send a starter as the first message.
    pub async fn send_starter(&mut self, starter: &str) -> Result<Option<String>, ClientError> {
        self.view.start_screen_visible = false;
        self.view.starters_visible = false;
        self.deliver(starter, STARTER_FAILED).await
    }

    pub fn dismiss_error(&mut self) {
        self.view.close_error();
    }

    async fn deliver(
        &mut self,
        text: &str,
        failure_notice: &str,
    ) -> Result<Option<String>, ClientError> {
        let content = text.trim();
        if content.is_empty() {
            return Ok(None);
        }

        if self.state != SessionState::Ready {
            return Err(ClientError::InvalidTransition {
                from: self.state,
                to: SessionState::Sending,
            });
        }
        let thread_id = self.thread_id.clone().ok_or(ClientError::NoActiveThread)?;
        self.transition(SessionState::Sending)?;

        self.view.set_input_enabled(false);
        self.view.push(ChatMessage::user(content));
        self.view.input.clear();
        self.view.typing = true;

        let sent = self.api.send_message(&thread_id, content).await;
        self.view.typing = false;

        let outcome = match sent {
            Ok(reply) => {
                self.view.push(ChatMessage::assistant(reply.message.clone()));
                Ok(Some(reply.message))
            }
            Err(e) => {
                tracing::error!(error = %e, thread_id = %thread_id, "Failed to send message");
                self.view.show_error(failure_notice);
                if let Err(te) = self.transition(SessionState::Error) {
                    tracing::warn!(error = %te, "Unexpected session state");
                }
                Err(e)
            }
        };

        self.view.set_input_enabled(true);
        self.view.focus_input();
        if let Err(te) = self.transition(SessionState::Ready) {
            tracing::warn!(error = %te, "Unexpected session state");
        }

        outcome
    }

    /// Toggle voice capture from the microphone button.
    pub fn toggle_voice(&mut self) -> bool {
        match self.voice.toggle() {
            Ok(recording) => recording,
            Err(e) => {
                self.surface_voice_error(&e);
                false
            }
        }
    }

    /// Feed one recognizer event into the input field.
    pub fn on_recognition(&mut self, event: RecognitionEvent) {
        if let Err(e) = self.voice.handle_event(event, &mut self.view.input) {
            self.surface_voice_error(&e);
        }
    }

    fn surface_voice_error(&mut self, err: &VoiceError) {
        let notice = match err {
            VoiceError::Unsupported => VOICE_UNSUPPORTED,
            VoiceError::Stopped(_) => VOICE_FAILED,
        };
        self.view.show_error(notice);
    }
}

impl<A: RelayApi> fmt::Debug for ChatSession<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSession")
            .field("state", &self.state)
            .field("thread_id", &self.thread_id)
            .field("voice", &self.voice)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use mentor_core::types::{ChatRole, HealthResponse, MessageReply, ThreadCreated};

    use crate::messages::INPUT_PLACEHOLDER;
    use crate::voice::{RecognizerError, RecognizerErrorKind, SpeechRecognizer};

    #[derive(Default)]
    struct FakeRelay {
        healthy: bool,
        replies: Mutex<VecDeque<Result<String, String>>>,
        health_calls: AtomicUsize,
        thread_calls: AtomicUsize,
        sent: Mutex<Vec<(String, String)>>,
    }

    impl FakeRelay {
        fn healthy() -> Self {
            Self {
                healthy: true,
                ..Default::default()
            }
        }

        fn reply(self, outcome: Result<&str, &str>) -> Self {
            self.replies
                .lock()
                .unwrap()
                .push_back(outcome.map(String::from).map_err(String::from));
            self
        }

        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RelayApi for FakeRelay {
        async fn health(&self) -> Result<HealthResponse, ClientError> {
            self.health_calls.fetch_add(1, Ordering::SeqCst);
            if self.healthy {
                Ok(HealthResponse {
                    status: "ok".into(),
                    message: "Server is running".into(),
                })
            } else {
                Err(ClientError::Transport("connection refused".into()))
            }
        }

        async fn create_thread(&self) -> Result<ThreadCreated, ClientError> {
            self.thread_calls.fetch_add(1, Ordering::SeqCst);
            Ok(ThreadCreated {
                id: "thread_1".into(),
                created_at: 1_700_000_000,
            })
        }

        async fn send_message(
            &self,
            thread_id: &str,
            content: &str,
        ) -> Result<MessageReply, ClientError> {
            self.sent
                .lock()
                .unwrap()
                .push((thread_id.to_string(), content.to_string()));
            let next = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("ok".to_string()));
            match next {
                Ok(message) => Ok(MessageReply {
                    message,
                    message_id: "msg_1".into(),
                    thread_id: thread_id.to_string(),
                }),
                Err(message) => Err(ClientError::Relay(message)),
            }
        }
    }

    async fn ready(relay: FakeRelay) -> ChatSession<FakeRelay> {
        let mut session = ChatSession::new(relay, VoiceCapture::unsupported());
        session.initialize().await.unwrap();
        session
    }

    #[test]
    fn test_valid_transitions() {
        assert!(SessionState::Uninitialized.can_transition_to(&SessionState::Loading));
        assert!(SessionState::Loading.can_transition_to(&SessionState::Ready));
        assert!(SessionState::Loading.can_transition_to(&SessionState::Error));
        assert!(SessionState::Ready.can_transition_to(&SessionState::Sending));
        assert!(SessionState::Sending.can_transition_to(&SessionState::Ready));
        assert!(SessionState::Sending.can_transition_to(&SessionState::Error));
        assert!(SessionState::Error.can_transition_to(&SessionState::Ready));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!SessionState::Uninitialized.can_transition_to(&SessionState::Ready));
        assert!(!SessionState::Ready.can_transition_to(&SessionState::Loading));
        assert!(!SessionState::Error.can_transition_to(&SessionState::Sending));
        assert!(!SessionState::Sending.can_transition_to(&SessionState::Sending));
        assert!(!SessionState::Ready.can_transition_to(&SessionState::Ready));
    }

    #[tokio::test]
    async fn test_initialize_opens_thread() {
        let session = ready(FakeRelay::healthy()).await;

        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.thread_id(), Some("thread_1"));
        let view = session.view();
        assert!(!view.loading);
        assert!(view.start_screen_visible);
        assert!(view.input_enabled);
        assert_eq!(view.placeholder, INPUT_PLACEHOLDER);
        assert!(view.error_modal.is_none());
    }

    #[tokio::test]
    async fn test_initialize_failure_is_permanent() {
        let mut session = ChatSession::new(FakeRelay::default(), VoiceCapture::unsupported());
        let err = session.initialize().await.unwrap_err();
        assert!(matches!(err, ClientError::RelayUnreachable(_)));

        assert_eq!(session.state(), SessionState::Error);
        assert_eq!(session.view().error_modal.as_deref(), Some(INIT_FAILED));
        assert!(!session.view().loading);
        assert!(!session.view().input_enabled);
        assert_eq!(session.api().thread_calls.load(Ordering::SeqCst), 0);

        let err = session.send_message("olá").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidTransition { .. }));
        assert!(session.api().sent().is_empty());

        session.dismiss_error();
        assert!(session.send_message("olá").await.is_err());
        assert_eq!(session.state(), SessionState::Error);
    }

    #[tokio::test]
    async fn test_initialize_twice_rejected() {
        let mut session = ready(FakeRelay::healthy()).await;
        assert!(session.initialize().await.is_err());
        assert_eq!(session.api().health_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_send_shows_both_messages() {
        let mut session = ready(FakeRelay::healthy().reply(Ok("Olá! Como posso ajudar?"))).await;

        let reply = session.send_message("  Olá  ").await.unwrap();
        assert_eq!(reply.as_deref(), Some("Olá! Como posso ajudar?"));

        let transcript = &session.view().transcript;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, ChatRole::User);
        assert_eq!(transcript[0].content, "Olá");
        assert_eq!(transcript[1].role, ChatRole::Assistant);
        assert_eq!(transcript[1].content, "Olá! Como posso ajudar?");
        assert_eq!(
            session.api().sent(),
            vec![("thread_1".to_string(), "Olá".to_string())]
        );

        let view = session.view();
        assert!(!view.typing);
        assert!(view.input_enabled);
        assert!(view.input_focused);
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_blank_message_makes_no_call() {
        let mut session = ready(FakeRelay::healthy()).await;
        assert_eq!(session.send_message("").await.unwrap(), None);
        assert_eq!(session.send_message("   \n\t").await.unwrap(), None);
        assert!(session.api().sent().is_empty());
        assert!(session.view().transcript.is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_recovers() {
        let mut session = ready(
            FakeRelay::healthy()
                .reply(Err("Run polling timeout after 60 attempts"))
                .reply(Ok("Voltei!")),
        )
        .await;

        let err = session.send_message("oi").await.unwrap_err();
        assert_eq!(err.to_string(), "Run polling timeout after 60 attempts");
        assert_eq!(session.state(), SessionState::Ready);
        let view = session.view();
        assert_eq!(view.error_modal.as_deref(), Some(SEND_FAILED));
        assert!(!view.typing);
        assert!(view.input_enabled);
        assert!(view.input_focused);
        assert_eq!(view.transcript.len(), 1);

        session.dismiss_error();
        assert!(session.view().error_modal.is_none());
        let reply = session.send_message("de novo").await.unwrap();
        assert_eq!(reply.as_deref(), Some("Voltei!"));
        assert_eq!(session.view().transcript.len(), 3);
    }

    #[tokio::test]
    async fn test_send_input_clears_field() {
        let mut session = ready(FakeRelay::healthy()).await;
        session.view_mut().input = "Como começo?".to_string();

        session.send_input().await.unwrap();
        assert!(session.view().input.is_empty());
        assert_eq!(session.api().sent()[0].1, "Como começo?");
    }

    #[tokio::test]
    async fn test_starter_flow() {
        let mut session = ready(FakeRelay::healthy().reply(Err("boom"))).await;

        session.start_chat();
        assert!(session.view().starters_visible);

        let err = session
            .send_starter(crate::messages::CONVERSATION_STARTERS[0])
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Relay(_)));
        let view = session.view();
        assert!(!view.start_screen_visible);
        assert!(!view.starters_visible);
        assert_eq!(view.error_modal.as_deref(), Some(STARTER_FAILED));
        assert!(view.input_enabled);
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_voice_unsupported_surfaces_once() {
        let mut session = ready(FakeRelay::healthy()).await;

        assert!(!session.toggle_voice());
        assert_eq!(session.view().error_modal.as_deref(), Some(VOICE_UNSUPPORTED));
        session.dismiss_error();

        assert!(!session.toggle_voice());
        assert!(session.view().error_modal.is_none());
    }

    struct SilentRecognizer;

    impl SpeechRecognizer for SilentRecognizer {
        fn start(&mut self) -> Result<(), RecognizerError> {
            Ok(())
        }

        fn stop(&mut self) {}
    }

    #[tokio::test]
    async fn test_voice_transcript_fills_input() {
        let mut session = ChatSession::new(
            FakeRelay::healthy(),
            VoiceCapture::new(Box::new(SilentRecognizer), 1),
        );
        session.initialize().await.unwrap();

        assert!(session.toggle_voice());
        session.on_recognition(RecognitionEvent::Result {
            is_final: true,
            transcript: "quero ideias novas".into(),
        });
        assert_eq!(session.view().input, "quero ideias novas");

        session.on_recognition(RecognitionEvent::End);
        assert!(session.voice().is_recording());
        session.on_recognition(RecognitionEvent::Error(RecognizerErrorKind::AudioCapture));
        assert!(!session.voice().is_recording());
        assert_eq!(session.view().error_modal.as_deref(), Some(VOICE_FAILED));

        session.send_input().await.unwrap();
        assert_eq!(session.api().sent()[0].1, "quero ideias novas");
    }
}
