use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::stream::FuturesUnordered;
use medicynth_core::{
    ChatController, Command, CommandRecognizer, FilePreferences, HttpChatClient,
    MemoryPreferences, Outcome, PreferenceStore, SpeechEvent, SystemClipboard, ViewModel,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// How long the copied marker stays on a turn
const COPIED_MARKER_DURATION: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
    /// Typing the path of a file to attach
    AttachPath,
}

/// Settings the terminal app starts from, after config file and CLI flags are merged
#[derive(Debug, Clone)]
pub struct Settings {
    pub server_url: String,
    pub speech_command: Option<String>,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub input_cursor: usize,
    pub path_input: String,

    // Chat pane
    pub selected_turn: Option<usize>,
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
    pub copied_at: Option<Instant>,

    pub server_url: String,
    pub controller: ChatController<ViewModel>,
    pub tasks: FuturesUnordered<JoinHandle<Outcome>>,
}

impl App {
    /// Returns the app and the receiving end of the speech event channel.
    pub fn new(settings: Settings) -> (Self, mpsc::UnboundedReceiver<SpeechEvent>) {
        let (speech_tx, speech_rx) = mpsc::unbounded_channel();

        let prefs: Box<dyn PreferenceStore> = match FilePreferences::open_default() {
            Ok(prefs) => Box::new(prefs),
            Err(e) => {
                tracing::warn!(error = %e, "preferences unavailable, theme will not persist");
                Box::new(MemoryPreferences::default())
            }
        };

        let api = Arc::new(HttpChatClient::new(&settings.server_url));
        let mut controller = ChatController::new(api, ViewModel::default(), prefs)
            .with_clipboard(Box::new(SystemClipboard));

        if let Some(command) = settings.speech_command.as_deref() {
            controller = controller.with_recognizer(Box::new(CommandRecognizer::new(command)), speech_tx);
        }

        let app = Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            input_cursor: 0,
            path_input: String::new(),

            selected_turn: None,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,
            copied_at: None,

            server_url: settings.server_url,
            controller,
            tasks: FuturesUnordered::new(),
        };

        (app, speech_rx)
    }

    pub fn view(&self) -> &ViewModel {
        self.controller.view()
    }

    /// Apply a command; any effect it needs runs as a background task.
    pub fn dispatch(&mut self, command: Command) {
        if let Some(effect) = self.controller.dispatch(command) {
            let api = self.controller.api();
            self.tasks.push(tokio::spawn(effect.run(api)));
        }
        self.clamp_cursor();
    }

    pub fn complete(&mut self, outcome: Outcome) {
        self.controller.complete(outcome);
        self.clamp_cursor();
        if let Some(selected) = self.selected_turn {
            if selected >= self.view().turns.len() {
                self.selected_turn = None;
            }
        }
        self.scroll_chat_to_bottom();
    }

    pub fn handle_speech(&mut self, event: SpeechEvent) {
        self.controller.handle_speech_event(event);
        self.input_cursor = self.view().input.chars().count();
    }

    pub fn submit_input(&mut self) {
        let text = self.view().input.clone();
        self.dispatch(Command::Submit(text));
        self.scroll_chat_to_bottom();
    }

    pub fn attach_from_input(&mut self) {
        let path = self.path_input.trim();
        if !path.is_empty() {
            let path = PathBuf::from(path);
            self.dispatch(Command::Attach(path));
        }
        self.path_input.clear();
        self.input_mode = InputMode::Editing;
    }

    pub fn copy_selected(&mut self) {
        if let Some(index) = self.selected_turn {
            self.dispatch(Command::CopyTurn(index));
            if self.view().copied == Some(index) {
                self.copied_at = Some(Instant::now());
            }
        }
    }

    /// Tick animation frame and expire the copied marker (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.view().pending_reply {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        if self
            .copied_at
            .is_some_and(|at| at.elapsed() >= COPIED_MARKER_DURATION)
        {
            self.copied_at = None;
            self.controller.view_mut().copied = None;
        }
    }

    pub fn select_next_turn(&mut self) {
        let len = self.view().turns.len();
        if len > 0 {
            let i = self.selected_turn.map(|i| (i + 1).min(len - 1)).unwrap_or(len - 1);
            self.selected_turn = Some(i);
        }
    }

    pub fn select_prev_turn(&mut self) {
        let len = self.view().turns.len();
        if len > 0 {
            let i = self.selected_turn.map(|i| i.saturating_sub(1)).unwrap_or(len - 1);
            self.selected_turn = Some(i);
        }
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    /// Scroll chat to bottom so the newest turn is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: usize = 0;

        for turn in &self.view().turns {
            total_lines = total_lines.saturating_add(1); // Role line ("You:" or "Medicynth:")
            let body = turn.copy_text();
            for line in body.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                total_lines = total_lines.saturating_add(char_count / wrap_width + 1);
            }
            if turn.media.is_some() {
                total_lines = total_lines.saturating_add(1);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.view().pending_reply {
            total_lines = total_lines.saturating_add(2);
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height as usize
        } else {
            20
        };

        let offset = total_lines.saturating_sub(visible_height);
        self.chat_scroll = u16::try_from(offset).unwrap_or(u16::MAX);
    }

    fn clamp_cursor(&mut self) {
        let len = self.view().input.chars().count();
        self.input_cursor = self.input_cursor.min(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medicynth_core::ChatReply;

    fn app() -> App {
        let (app, _speech_rx) = App::new(Settings {
            server_url: "http://localhost:5000".to_string(),
            speech_command: None,
        });
        app
    }

    #[test]
    fn test_scroll_to_bottom_follows_reply() {
        let mut app = app();
        app.chat_width = 40;
        app.chat_height = 10;

        app.complete(Outcome::ChatReplied(Ok(ChatReply {
            response: "line\n".repeat(30),
            ..ChatReply::default()
        })));

        assert!(app.chat_scroll > 0);
        assert!(app.chat_scroll < 60);
    }

    #[test]
    fn test_scroll_to_bottom_saturates_on_huge_transcript() {
        let mut app = app();

        app.complete(Outcome::ChatReplied(Ok(ChatReply {
            response: "line\n".repeat(70_000),
            ..ChatReply::default()
        })));
        assert_eq!(app.chat_scroll, u16::MAX);

        app.complete(Outcome::ChatReplied(Ok(ChatReply {
            response: "x".repeat(100_000),
            ..ChatReply::default()
        })));
        assert_eq!(app.chat_scroll, u16::MAX);
    }

    #[test]
    fn test_copied_marker_expires_on_tick() {
        let mut app = app();
        app.controller.view_mut().copied = Some(0);
        app.copied_at = Some(Instant::now());

        app.tick_animation();
        assert_eq!(app.view().copied, Some(0));

        app.copied_at = Instant::now().checked_sub(Duration::from_secs(2));
        app.tick_animation();
        assert_eq!(app.view().copied, None);
        assert!(app.copied_at.is_none());
    }
}
