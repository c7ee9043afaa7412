//! Voice capture.
//!
//! Wraps a platform speech recognizer and turns its event stream into text
//! appended to the message input. Transitions:
//! - Idle -> Recording (toggle, recognizer started)
//! - Recording -> Idle (toggle, or restart budget exhausted)
//! - Recording -> Recording (automatic restart after an error or an
//!   unexpected end, while the budget allows it)

use crate::error::VoiceError;

/// Why the recognizer reported an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerErrorKind {
    /// Silence. Recording continues.
    NoSpeech,
    /// Microphone permission denied.
    NotAllowed,
    /// No audio input device could be opened.
    AudioCapture,
    Network,
    Aborted,
    Other(String),
}

impl RecognizerErrorKind {
    pub fn as_str(&self) -> &str {
        match self {
            RecognizerErrorKind::NoSpeech => "no-speech",
            RecognizerErrorKind::NotAllowed => "not-allowed",
            RecognizerErrorKind::AudioCapture => "audio-capture",
            RecognizerErrorKind::Network => "network",
            RecognizerErrorKind::Aborted => "aborted",
            RecognizerErrorKind::Other(code) => code,
        }
    }
}

/// One event from the recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Result { is_final: bool, transcript: String },
    Error(RecognizerErrorKind),
    /// The recognizer stopped on its own.
    End,
}

/// Failure to start a recognizer session.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct RecognizerError(pub String);

/// A continuous, interim-results speech recognizer.
pub trait SpeechRecognizer: Send {
    fn start(&mut self) -> Result<(), RecognizerError>;

    fn stop(&mut self);
}

/// Voice capture state for one chat widget.
pub struct VoiceCapture {
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    recording: bool,
    restart_limit: u32,
    restarts: u32,
    interim: String,
    unsupported_reported: bool,
}

impl VoiceCapture {
    pub fn new(recognizer: Box<dyn SpeechRecognizer>, restart_limit: u32) -> Self {
        Self {
            recognizer: Some(recognizer),
            recording: false,
            restart_limit,
            restarts: 0,
            interim: String::new(),
            unsupported_reported: false,
        }
    }

    /// Capture on a platform without speech recognition.
    pub fn unsupported() -> Self {
        Self {
            recognizer: None,
            recording: false,
            restart_limit: 0,
            restarts: 0,
            interim: String::new(),
            unsupported_reported: false,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Latest non-final transcript, for display only.
    pub fn interim(&self) -> &str {
        &self.interim
    }

    /// Start recording when idle, stop when recording. Returns whether
    /// recording is active afterwards.
    ///
    /// On an unsupported platform the first call returns
    /// `VoiceError::Unsupported`; later calls are no-ops.
    pub fn toggle(&mut self) -> Result<bool, VoiceError> {
        let Some(recognizer) = self.recognizer.as_mut() else {
            if self.unsupported_reported {
                return Ok(false);
            }
            self.unsupported_reported = true;
            tracing::warn!("Speech recognition not available");
            return Err(VoiceError::Unsupported);
        };

        if self.recording {
            recognizer.stop();
            self.recording = false;
            self.interim.clear();
            tracing::debug!("Voice capture stopped");
            return Ok(false);
        }

        recognizer
            .start()
            .map_err(|e| VoiceError::Stopped(e.to_string()))?;
        self.recording = true;
        self.restarts = 0;
        tracing::debug!("Voice capture started");
        Ok(true)
    }

    /// Apply one recognizer event. Finalized text is appended to `input`.
    ///
    /// Returns `VoiceError::Stopped` when recording ends because the
    /// restart budget ran out.
    pub fn handle_event(
        &mut self,
        event: RecognitionEvent,
        input: &mut String,
    ) -> Result<(), VoiceError> {
        match event {
            RecognitionEvent::Result {
                is_final: true,
                transcript,
            } => {
                self.interim.clear();
                append_segment(input, &transcript);
                self.restarts = 0;
                Ok(())
            }
            RecognitionEvent::Result {
                is_final: false,
                transcript,
            } => {
                self.interim = transcript;
                Ok(())
            }
            RecognitionEvent::Error(RecognizerErrorKind::NoSpeech) => Ok(()),
            RecognitionEvent::Error(kind) => {
                if !self.recording {
                    return Ok(());
                }
                tracing::warn!(error = kind.as_str(), "Speech recognizer error");
                self.restart(kind.as_str().to_string())
            }
            RecognitionEvent::End => {
                if !self.recording {
                    return Ok(());
                }
                self.restart("ended unexpectedly".to_string())
            }
        }
    }

    fn restart(&mut self, cause: String) -> Result<(), VoiceError> {
        let Some(recognizer) = self.recognizer.as_mut() else {
            self.recording = false;
            return Err(VoiceError::Unsupported);
        };

        if self.restarts < self.restart_limit {
            self.restarts += 1;
            match recognizer.start() {
                Ok(()) => {
                    tracing::info!(attempt = self.restarts, "Voice capture restarted");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Voice capture restart failed");
                }
            }
        }

        recognizer.stop();
        self.recording = false;
        self.interim.clear();
        Err(VoiceError::Stopped(cause))
    }
}

impl std::fmt::Debug for VoiceCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceCapture")
            .field("supported", &self.is_supported())
            .field("recording", &self.recording)
            .field("restart_limit", &self.restart_limit)
            .field("restarts", &self.restarts)
            .finish()
    }
}

fn append_segment(input: &mut String, segment: &str) {
    let segment = segment.trim();
    if segment.is_empty() {
        return;
    }
    if !input.is_empty() && !input.ends_with(char::is_whitespace) {
        input.push(' ');
    }
    input.push_str(segment);
}
