//! Terminal front end for a chat session.
//!
//! Renders the session's view model as plain text and maps input lines to
//! session operations.

use mentor_client::messages::CONVERSATION_STARTERS;
use mentor_client::{ChatSession, HttpRelayApi, RelayApi, VoiceCapture};
use mentor_core::error::MentorError;
use mentor_core::types::ChatRole;
use tokio::io::{AsyncBufReadExt, BufReader};

/// One line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Show the conversation starters.
    Start,
    /// Send starter number `n` (1-based).
    Starter(usize),
    Voice,
    Quit,
    /// Free text for the message input.
    Message(String),
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "/iniciar" | "/start" => ChatCommand::Start,
            "/voz" | "/voice" => ChatCommand::Voice,
            "/sair" | "/quit" => ChatCommand::Quit,
            other => match other.strip_prefix('/').and_then(|n| n.parse::<usize>().ok()) {
                Some(n) => ChatCommand::Starter(n),
                None => ChatCommand::Message(line.to_string()),
            },
        }
    }
}

/// Run an interactive session against the relay at `relay_url`.
pub async fn run(relay_url: String) -> Result<(), MentorError> {
    tracing::info!(relay_url = %relay_url, "Connecting to relay");
    let mut session = ChatSession::new(HttpRelayApi::new(relay_url), VoiceCapture::unsupported());
    let mut shown = 0;

    let init = session.initialize().await;
    render(&mut session, &mut shown);
    init?;

    println!("Mentor Divergente. /iniciar para sugestões, /voz para ditado, /sair para sair.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !dispatch(&mut session, ChatCommand::parse(&line)).await {
            break;
        }
        render(&mut session, &mut shown);
    }

    tracing::info!("Chat session ended");
    Ok(())
}

/// Apply one command. Returns `false` when the user asked to quit.
///
/// Send failures are already on the view's error modal, so they are only
/// logged here.
async fn dispatch<A: RelayApi>(session: &mut ChatSession<A>, command: ChatCommand) -> bool {
    match command {
        ChatCommand::Quit => return false,
        ChatCommand::Start => {
            session.start_chat();
            for (i, starter) in CONVERSATION_STARTERS.iter().enumerate() {
                println!("  /{} {}", i + 1, starter);
            }
        }
        ChatCommand::Starter(n) => {
            match n.checked_sub(1).and_then(|i| CONVERSATION_STARTERS.get(i)) {
                Some(starter) => {
                    if let Err(e) = session.send_starter(starter).await {
                        tracing::debug!(error = %e, "Starter not delivered");
                    }
                }
                None => println!("Sugestão inexistente: {}", n),
            }
        }
        ChatCommand::Voice => {
            session.toggle_voice();
        }
        ChatCommand::Message(text) => {
            session.view_mut().input = text;
            if let Err(e) = session.send_input().await {
                tracing::debug!(error = %e, "Message not delivered");
            }
        }
    }
    true
}

/// Print transcript entries added since the last call, then any error.
fn render<A: RelayApi>(session: &mut ChatSession<A>, shown: &mut usize) {
    let transcript = &session.view().transcript;
    for message in transcript.iter().skip(*shown) {
        match message.role {
            ChatRole::User => println!("você > {}", message.content),
            ChatRole::Assistant => println!("mentor > {}", message.content),
        }
    }
    *shown = transcript.len();

    if let Some(notice) = session.view().error_modal.clone() {
        eprintln!("! {}", notice);
        session.dismiss_error();
    }
}
