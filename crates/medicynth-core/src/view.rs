//! Render instructions emitted by the session controller.
//!
//! The controller never touches a widget tree. It calls into a [`View`], and a
//! front-end draws whatever state that view ends up holding.

use crate::attachment::AttachmentPreview;
use crate::markdown;
use crate::prefs::Theme;
use crate::state::TurnRole;

/// A turn as it should appear on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTurn {
    pub role: TurnRole,
    pub markup: String,
    pub media: Option<String>,
    /// `Script: <name>` line shown under a model reply
    pub script_line: Option<String>,
    /// `Context: <n> messages` line shown under a model reply
    pub context_line: Option<String>,
    pub is_error: bool,
    pub copyable: bool,
}

impl RenderedTurn {
    /// Message body as plain text
    pub fn visible_text(&self) -> String {
        markdown::visible_text(&self.markup)
    }

    /// Everything a reader sees in the bubble, one block per line.
    pub fn copy_text(&self) -> String {
        let mut lines = vec![self.visible_text()];
        lines.extend(self.script_line.iter().cloned());
        lines.extend(self.context_line.iter().cloned());
        lines.join("\n")
    }
}

pub trait View {
    fn append_turn(&mut self, turn: RenderedTurn);
    fn clear_transcript(&mut self);
    /// Placeholder shown while a reply is outstanding
    fn set_pending_reply(&mut self, pending: bool);
    /// Disables input, send, mic, and attach controls
    fn set_loading(&mut self, loading: bool);
    fn show_preview(&mut self, preview: Option<AttachmentPreview>);
    fn set_input(&mut self, text: &str);
    fn focus_input(&mut self);
    fn set_voice_available(&mut self, available: bool);
    fn set_listening(&mut self, listening: bool);
    fn apply_theme(&mut self, theme: Theme);
    fn mark_copied(&mut self, index: usize);
}

/// Display state built from render instructions.
#[derive(Debug, Clone, Default)]
pub struct ViewModel {
    pub turns: Vec<RenderedTurn>,
    pub pending_reply: bool,
    pub controls_disabled: bool,
    pub preview: Option<AttachmentPreview>,
    pub input: String,
    pub input_focused: bool,
    pub voice_available: bool,
    pub listening: bool,
    pub theme: Theme,
    pub copied: Option<usize>,
}

impl View for ViewModel {
    fn append_turn(&mut self, turn: RenderedTurn) {
        self.turns.push(turn);
    }

    fn clear_transcript(&mut self) {
        self.turns.clear();
        self.copied = None;
    }

    fn set_pending_reply(&mut self, pending: bool) {
        self.pending_reply = pending;
    }

    fn set_loading(&mut self, loading: bool) {
        self.controls_disabled = loading;
        if loading {
            self.input_focused = false;
        }
    }

    fn show_preview(&mut self, preview: Option<AttachmentPreview>) {
        self.preview = preview;
    }

    fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
    }

    fn focus_input(&mut self) {
        self.input_focused = true;
    }

    fn set_voice_available(&mut self, available: bool) {
        self.voice_available = available;
    }

    fn set_listening(&mut self, listening: bool) {
        self.listening = listening;
    }

    fn apply_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    fn mark_copied(&mut self, index: usize) {
        self.copied = Some(index);
    }
}
