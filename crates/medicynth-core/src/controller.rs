//! Chat session controller.
//!
//! Owns the transient session state (transcript, pending attachment, loading
//! flag) and turns user commands into render instructions on a [`View`].
//! Work that has to wait on the network or the filesystem is handed back to
//! the caller as an [`Effect`]; its result comes back through
//! [`ChatController::complete`].

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::api::{ChatApi, ChatReply, ChatRequest};
use crate::attachment::{self, Attachment, LoadedFile};
use crate::clipboard::Clipboard;
use crate::error::{Error, Result};
use crate::markdown;
use crate::prefs::{PreferenceStore, Theme, THEME_KEY};
use crate::script::script_label;
use crate::speech::{transcript_from, SpeechEvent, SpeechRecognizer};
use crate::state::{ConversationTurn, Transcript, TurnRole, WELCOME_MESSAGE};
use crate::view::{RenderedTurn, View};

/// A user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Submit(String),
    Attach(PathBuf),
    ClearAttachment,
    ResetConversation,
    ToggleVoice,
    ToggleTheme,
    CopyTurn(usize),
}

/// Asynchronous work requested by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SendChat(ChatRequest),
    ClearHistory,
    ReadAttachment(PathBuf),
}

impl Effect {
    pub async fn run(self, api: Arc<dyn ChatApi>) -> Outcome {
        match self {
            Effect::SendChat(request) => Outcome::ChatReplied(api.send_chat(request).await),
            Effect::ClearHistory => Outcome::HistoryCleared(api.clear_history().await),
            Effect::ReadAttachment(path) => {
                Outcome::AttachmentRead(attachment::read_attachment(&path).await)
            }
        }
    }
}

/// Result of an [`Effect`]
#[derive(Debug)]
pub enum Outcome {
    ChatReplied(Result<ChatReply>),
    HistoryCleared(Result<()>),
    AttachmentRead(Result<LoadedFile>),
}

pub struct ChatController<V: View> {
    api: Arc<dyn ChatApi>,
    view: V,
    transcript: Transcript,
    rendered: Vec<RenderedTurn>,
    attachment: Option<Attachment>,
    loading: bool,
    theme: Theme,
    prefs: Box<dyn PreferenceStore>,
    clipboard: Option<Box<dyn Clipboard>>,
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    speech_events: Option<UnboundedSender<SpeechEvent>>,
    listening: bool,
}

impl<V: View> ChatController<V> {
    pub fn new(api: Arc<dyn ChatApi>, view: V, prefs: Box<dyn PreferenceStore>) -> Self {
        let theme = prefs
            .get(THEME_KEY)
            .and_then(|t| Theme::from_str(&t))
            .unwrap_or_default();

        let mut controller = Self {
            api,
            view,
            transcript: Transcript::default(),
            rendered: Vec::new(),
            attachment: None,
            loading: false,
            theme,
            prefs,
            clipboard: None,
            recognizer: None,
            speech_events: None,
            listening: false,
        };

        controller.view.apply_theme(theme);
        controller.view.set_voice_available(false);
        controller.seed_welcome();
        controller.view.focus_input();
        controller
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn Clipboard>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    /// Enables voice capture. Results are delivered on `events` and must be
    /// fed back through [`ChatController::handle_speech_event`].
    pub fn with_recognizer(
        mut self,
        recognizer: Box<dyn SpeechRecognizer>,
        events: UnboundedSender<SpeechEvent>,
    ) -> Self {
        self.recognizer = Some(recognizer);
        self.speech_events = Some(events);
        self.view.set_voice_available(true);
        self
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn api(&self) -> Arc<dyn ChatApi> {
        Arc::clone(&self.api)
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn pending_attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Apply a user action. Returns the asynchronous work it needs, if any.
    pub fn dispatch(&mut self, command: Command) -> Option<Effect> {
        match command {
            Command::Submit(text) => self.begin_submit(&text),
            Command::Attach(path) => self.begin_attach(path),
            Command::ResetConversation => Some(Effect::ClearHistory),
            Command::ClearAttachment => {
                self.clear_attachment();
                None
            }
            Command::ToggleVoice => {
                self.toggle_voice_capture();
                None
            }
            Command::ToggleTheme => {
                self.toggle_theme();
                None
            }
            Command::CopyTurn(index) => {
                self.copy_turn(index);
                None
            }
        }
    }

    /// Dispatch a command and run its effect to completion.
    pub async fn run_command(&mut self, command: Command) {
        if let Some(effect) = self.dispatch(command) {
            let outcome = effect.run(self.api()).await;
            self.complete(outcome);
        }
    }

    pub async fn submit(&mut self, text: &str) {
        self.run_command(Command::Submit(text.to_string())).await;
    }

    pub async fn attach(&mut self, path: impl Into<PathBuf>) {
        self.run_command(Command::Attach(path.into())).await;
    }

    pub async fn reset_conversation(&mut self) {
        self.run_command(Command::ResetConversation).await;
    }

    fn begin_submit(&mut self, text: &str) -> Option<Effect> {
        if self.loading {
            tracing::debug!("submit ignored while a request is in flight");
            return None;
        }

        let prompt = text.trim();
        if prompt.is_empty() && self.attachment.is_none() {
            return None;
        }

        self.loading = true;
        self.view.set_loading(true);
        self.view.set_input("");

        let image = self.attachment.take();
        self.view.show_preview(None);

        let media = image.as_ref().map(Attachment::data_url);
        self.transcript
            .push(ConversationTurn::user(prompt, media.clone()));
        self.render(RenderedTurn {
            role: TurnRole::User,
            markup: markdown::user_markup(prompt),
            media,
            script_line: None,
            context_line: None,
            is_error: false,
            copyable: false,
        });
        self.view.set_pending_reply(true);

        tracing::info!(
            chars = prompt.chars().count(),
            attachment = image.is_some(),
            "sending message"
        );

        Some(Effect::SendChat(ChatRequest {
            message: prompt.to_string(),
            image,
        }))
    }

    fn begin_attach(&mut self, path: PathBuf) -> Option<Effect> {
        if self.loading {
            tracing::debug!("attach ignored while a request is in flight");
            return None;
        }
        Some(Effect::ReadAttachment(path))
    }

    /// Feed back the result of an [`Effect`].
    pub fn complete(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::ChatReplied(result) => self.finish_submit(result),
            Outcome::HistoryCleared(Ok(())) => {
                tracing::info!("conversation reset");
                self.transcript.restart();
                self.rendered.clear();
                self.view.clear_transcript();
                self.seed_welcome();
                self.clear_attachment();
                self.view.focus_input();
            }
            Outcome::HistoryCleared(Err(e)) => {
                tracing::error!(error = %e, "error clearing chat");
            }
            Outcome::AttachmentRead(Ok(file)) => {
                tracing::info!(
                    file = %file.preview.file_name,
                    kind = file.preview.kind.label(),
                    "attachment ready"
                );
                self.attachment = Some(file.attachment);
                self.view.show_preview(Some(file.preview));
            }
            Outcome::AttachmentRead(Err(e)) => {
                tracing::warn!(error = %e, "failed to read attachment");
            }
        }
    }

    fn finish_submit(&mut self, result: Result<ChatReply>) {
        self.view.set_pending_reply(false);

        match result {
            Ok(reply) => {
                let script_line = reply
                    .detected_script
                    .as_deref()
                    .and_then(script_label)
                    .map(|label| format!("Script: {}", label));
                let context_line = reply
                    .history_length
                    .filter(|&n| n > 0)
                    .map(|n| format!("Context: {} messages", n));

                self.transcript.push(ConversationTurn::model(&reply.response));
                self.render(RenderedTurn {
                    role: TurnRole::Model,
                    markup: markdown::to_markup(&reply.response),
                    media: None,
                    script_line,
                    context_line,
                    is_error: false,
                    copyable: true,
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat request failed");
                self.push_error_turn(&e);
            }
        }

        self.loading = false;
        self.view.set_loading(false);
        self.view.focus_input();
    }

    fn push_error_turn(&mut self, error: &Error) {
        let content = format!("**Error:** {}", error.user_message());
        self.render(RenderedTurn {
            role: TurnRole::Model,
            markup: markdown::to_markup(&content),
            media: None,
            script_line: None,
            context_line: None,
            is_error: true,
            copyable: false,
        });
        self.transcript.push(ConversationTurn::model(content));
    }

    fn seed_welcome(&mut self) {
        self.transcript.push(ConversationTurn::model(WELCOME_MESSAGE));
        self.render(RenderedTurn {
            role: TurnRole::Model,
            markup: markdown::to_markup(WELCOME_MESSAGE),
            media: None,
            script_line: None,
            context_line: None,
            is_error: false,
            copyable: true,
        });
    }

    fn render(&mut self, turn: RenderedTurn) {
        self.rendered.push(turn.clone());
        self.view.append_turn(turn);
    }

    pub fn clear_attachment(&mut self) {
        self.attachment = None;
        self.view.show_preview(None);
    }

    pub fn toggle_voice_capture(&mut self) {
        if self.loading {
            return;
        }
        let (Some(recognizer), Some(events)) = (self.recognizer.as_mut(), self.speech_events.as_ref())
        else {
            return;
        };

        if self.listening {
            recognizer.stop();
            return;
        }

        if let Err(e) = recognizer.start(events.clone()) {
            tracing::error!(error = %e, "speech recognition error");
            self.listening = false;
            self.view.set_listening(false);
        }
    }

    pub fn handle_speech_event(&mut self, event: SpeechEvent) {
        match event {
            SpeechEvent::Started => {
                self.listening = true;
                self.view.set_listening(true);
            }
            SpeechEvent::Result {
                result_index,
                results,
            } => {
                self.view.set_input(&transcript_from(result_index, &results));
            }
            SpeechEvent::Error(message) => {
                tracing::error!(error = %message, "speech recognition error");
                self.listening = false;
                self.view.set_listening(false);
            }
            SpeechEvent::Ended => {
                self.listening = false;
                self.view.set_listening(false);
            }
        }
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        self.view.apply_theme(self.theme);
        if let Err(e) = self.prefs.set(THEME_KEY, self.theme.as_str()) {
            tracing::warn!(error = %e, "failed to persist theme");
        }
    }

    /// Copy the visible text of a reply to the clipboard.
    pub fn copy_turn(&mut self, index: usize) {
        let Some(turn) = self.rendered.get(index).filter(|t| t.copyable) else {
            return;
        };
        let Some(clipboard) = self.clipboard.as_ref() else {
            return;
        };

        match clipboard.write_text(&turn.copy_text()) {
            Ok(()) => self.view.mark_copied(index),
            Err(e) => tracing::error!(error = %e, "failed to copy text"),
        }
    }
}
