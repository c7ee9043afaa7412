//! What the widget shows. The session mutates this; a renderer reads it.

use mentor_core::types::ChatMessage;

use crate::messages::INPUT_PLACEHOLDER;

#[derive(Debug, Clone, Default)]
pub struct ChatView {
    pub loading: bool,
    pub start_screen_visible: bool,
    pub starters_visible: bool,
    pub typing: bool,
    pub input: String,
    pub input_enabled: bool,
    pub input_focused: bool,
    pub placeholder: String,
    pub transcript: Vec<ChatMessage>,
    pub error_modal: Option<String>,
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the input. The placeholder is filled in the first
    /// time the input is enabled and left alone afterwards.
    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
        if !enabled {
            self.input_focused = false;
        } else if self.placeholder.is_empty() {
            self.placeholder = INPUT_PLACEHOLDER.to_string();
        }
    }

    pub fn focus_input(&mut self) {
        if self.input_enabled {
            self.input_focused = true;
        }
    }

    pub fn show_error(&mut self, message: &str) {
        self.error_modal = Some(message.to_string());
    }

    pub fn close_error(&mut self) {
        self.error_modal = None;
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.transcript.push(message);
    }
}
