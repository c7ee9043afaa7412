//! User-facing strings. The widget is Portuguese-only.

pub const INPUT_PLACEHOLDER: &str = "Digite sua mensagem...";

pub const INIT_FAILED: &str =
    "Não foi possível inicializar o chat. Verifique sua conexão e recarregue a página.";

pub const SEND_FAILED: &str = "Não foi possível enviar a mensagem. Tente novamente.";

pub const STARTER_FAILED: &str = "Não foi possível iniciar a conversa. Tente novamente.";

pub const VOICE_UNSUPPORTED: &str =
    "Seu navegador não suporta reconhecimento de voz. Digite sua mensagem.";

pub const VOICE_FAILED: &str =
    "A gravação de voz foi interrompida. Verifique o microfone e tente novamente.";

/// Conversation starters offered on the start screen.
pub const CONVERSATION_STARTERS: [&str; 3] = [
    "Como posso transformar uma ideia em um projeto?",
    "Estou travado. Pode me ajudar a pensar diferente?",
    "Quero desenvolver minha criatividade. Por onde começo?",
];
