pub mod api;
pub mod attachment;
pub mod clipboard;
pub mod config;
pub mod controller;
pub mod error;
pub mod markdown;
pub mod prefs;
pub mod script;
pub mod speech;
pub mod state;
pub mod view;

// Re-export main types for convenience
pub use api::{ChatApi, ChatReply, ChatRequest, HttpChatClient};
pub use attachment::{Attachment, AttachmentPreview, FileKind, LoadedFile};
pub use clipboard::{Clipboard, SystemClipboard};
pub use config::Config;
pub use controller::{ChatController, Command, Effect, Outcome};
pub use error::{Error, Result};
pub use prefs::{FilePreferences, MemoryPreferences, PreferenceStore, Theme};
pub use speech::{CommandRecognizer, SpeechEvent, SpeechRecognizer};
pub use state::{ConversationTurn, TurnRole, WELCOME_MESSAGE};
pub use view::{RenderedTurn, View, ViewModel};
