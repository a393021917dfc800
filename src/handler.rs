use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use medicynth_core::Command;
use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Speech(event) => app.handle_speech(event),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
        InputMode::AttachPath => handle_attach_path(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    let disabled = app.view().controls_disabled;

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Char('i') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
            app.input_cursor = app.view().input.chars().count();
        }

        // Transcript navigation
        KeyCode::Char('j') | KeyCode::Down => app.select_next_turn(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev_turn(),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            for _ in 0..app.chat_height / 2 {
                app.scroll_down();
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            for _ in 0..app.chat_height / 2 {
                app.scroll_up();
            }
        }
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),
        KeyCode::Char('g') => app.chat_scroll = 0,

        KeyCode::Char('c') => app.copy_selected(),

        KeyCode::Char('a') if !disabled => {
            app.path_input.clear();
            app.input_mode = InputMode::AttachPath;
        }
        KeyCode::Char('x') => app.dispatch(Command::ClearAttachment),
        KeyCode::Char('n') => app.dispatch(Command::ResetConversation),
        KeyCode::Char('v') => app.dispatch(Command::ToggleVoice),
        KeyCode::Char('t') => app.dispatch(Command::ToggleTheme),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.input_mode = InputMode::Normal;
        return;
    }

    // Input is read-only while a reply is outstanding
    if app.view().controls_disabled {
        return;
    }

    let cursor = app.input_cursor;
    match key.code {
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
            insert_char(app, '\n');
        }
        KeyCode::Enter => {
            app.submit_input();
        }
        KeyCode::Char('v') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.dispatch(Command::ToggleVoice);
        }
        KeyCode::Backspace => {
            if cursor > 0 {
                let input = &mut app.controller.view_mut().input;
                let byte_pos = char_to_byte_index(input, cursor - 1);
                input.remove(byte_pos);
                app.input_cursor -= 1;
            }
        }
        KeyCode::Delete => {
            let input = &mut app.controller.view_mut().input;
            if cursor < input.chars().count() {
                let byte_pos = char_to_byte_index(input, cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.view().input.chars().count();
            app.input_cursor = (cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.view().input.chars().count();
        }
        KeyCode::Char(c) => insert_char(app, c),
        _ => {}
    }
}

fn insert_char(app: &mut App, c: char) {
    let cursor = app.input_cursor;
    let input = &mut app.controller.view_mut().input;
    let byte_pos = char_to_byte_index(input, cursor);
    input.insert(byte_pos, c);
    app.input_cursor += 1;
}

fn handle_attach_path(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.path_input.clear();
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Enter => app.attach_from_input(),
        KeyCode::Backspace => {
            app.path_input.pop();
        }
        KeyCode::Char(c) => app.path_input.push(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_to_byte_index() {
        assert_eq!(char_to_byte_index("héllo", 2), 3);
        assert_eq!(char_to_byte_index("abc", 10), 3);
    }
}
