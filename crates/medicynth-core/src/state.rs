//! UI-agnostic conversation types
//!
//! These are shared by every front-end (terminal UI, one-shot CLI) and don't
//! depend on any specific UI framework.

use serde::{Deserialize, Serialize};

/// Fixed greeting shown in a fresh or reset conversation
pub const WELCOME_MESSAGE: &str =
    "Hello! I'm Medicynth, your AI health assistant. How can I help you today?";

/// Who a turn is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Model => "model",
        }
    }
}

/// One message in the transcript. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    role: TurnRole,
    content: String,
    media: Option<String>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>, media: Option<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            media,
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            content: content.into(),
            media: None,
        }
    }

    pub fn role(&self) -> TurnRole {
        self.role
    }

    /// Raw text as typed or returned by the API, before rendering
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Attached media as a `data:` URL
    pub fn media(&self) -> Option<&str> {
        self.media.as_deref()
    }
}

/// Splits a `data:<mime>;base64,<payload>` URL into its MIME type.
pub fn data_url_mime(data_url: &str) -> Option<&str> {
    let header = data_url.strip_prefix("data:")?.split(',').next()?;
    let mime = header.split(';').next()?;
    (!mime.is_empty()).then_some(mime)
}

/// Sequence of turns for one session. Only grows until the session is reset.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    turns: Vec<ConversationTurn>,
}

impl Transcript {
    pub fn push(&mut self, turn: ConversationTurn) -> usize {
        self.turns.push(turn);
        self.turns.len() - 1
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Ends the current session; a new one starts empty.
    pub(crate) fn restart(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_mime() {
        assert_eq!(data_url_mime("data:image/png;base64,AAAA"), Some("image/png"));
        assert_eq!(data_url_mime("data:;base64,AAAA"), None);
        assert_eq!(data_url_mime("image/png"), None);
    }

    #[test]
    fn test_transcript_appends_in_order() {
        let mut transcript = Transcript::default();
        assert_eq!(transcript.push(ConversationTurn::user("hi", None)), 0);
        assert_eq!(transcript.push(ConversationTurn::model("hello")), 1);
        assert_eq!(transcript.turns()[0].role(), TurnRole::User);
        assert_eq!(transcript.turns()[1].content(), "hello");
    }
}
