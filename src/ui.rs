use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use medicynth_core::{markdown::unescape, state::data_url_mime, RenderedTurn, Theme, TurnRole};
use crate::app::{App, InputMode};

/// Colors for one theme
struct Palette {
    fg: Color,
    bg: Color,
    muted: Color,
    accent: Color,
    user: Color,
    error_bg: Color,
    code: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            fg: Color::White,
            bg: Color::Black,
            muted: Color::DarkGray,
            accent: Color::Magenta,
            user: Color::Cyan,
            error_bg: Color::Red,
            code: Color::Yellow,
        },
        Theme::Light => Palette {
            fg: Color::Black,
            bg: Color::White,
            muted: Color::Gray,
            accent: Color::Magenta,
            user: Color::Blue,
            error_bg: Color::LightRed,
            code: Color::Rgb(160, 80, 0),
        },
    }
}

/// Turn rendered chat markup into styled terminal lines.
///
/// Only the tags the markdown transform emits are recognized; anything else is
/// printed as text.
fn markup_to_lines(markup: &str, base: Style, code: Color) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut bold = 0u8;
    let mut italic = 0u8;
    let mut in_code = 0u8;
    let mut rest = markup;

    let style_for = |bold: u8, italic: u8, in_code: u8| {
        let mut style = base;
        if bold > 0 {
            style = style.add_modifier(Modifier::BOLD);
        }
        if italic > 0 {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if in_code > 0 {
            style = style.fg(code);
        }
        style
    };

    while !rest.is_empty() {
        let Some(start) = rest.find('<') else {
            spans.push(Span::styled(unescape(rest), style_for(bold, italic, in_code)));
            break;
        };

        if start > 0 {
            spans.push(Span::styled(unescape(&rest[..start]), style_for(bold, italic, in_code)));
        }

        let after = &rest[start..];
        let Some(end) = after.find('>') else {
            spans.push(Span::styled(unescape(after), style_for(bold, italic, in_code)));
            break;
        };

        match &after[..=end] {
            "<br>" => lines.push(Line::from(std::mem::take(&mut spans))),
            "<strong>" => bold += 1,
            "</strong>" => bold = bold.saturating_sub(1),
            "<em>" => italic += 1,
            "</em>" => italic = italic.saturating_sub(1),
            "<code>" => in_code += 1,
            "</code>" => in_code = in_code.saturating_sub(1),
            "<pre>" | "</pre>" => {}
            other => spans.push(Span::styled(other.to_string(), style_for(bold, italic, in_code))),
        }
        rest = &after[end + 1..];
    }

    lines.push(Line::from(spans));
    lines
}

fn turn_lines(turn: &RenderedTurn, index: usize, app: &App, colors: &Palette) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let selected = app.selected_turn == Some(index);

    let (label, label_color) = match turn.role {
        TurnRole::User => ("You:", colors.user),
        TurnRole::Model => ("Medicynth:", colors.accent),
    };
    let mut header = vec![Span::styled(label, Style::default().fg(label_color).bold())];
    if selected {
        header.push(Span::styled(" ◀", Style::default().fg(colors.muted)));
    }
    if app.view().copied == Some(index) {
        header.push(Span::styled(" ✓ copied", Style::default().fg(Color::Green)));
    }
    lines.push(Line::from(header));

    if let Some(media) = turn.media.as_deref() {
        let mime = data_url_mime(media).unwrap_or("file");
        lines.push(Line::from(Span::styled(
            format!("[attachment: {}]", mime),
            Style::default().fg(colors.muted).italic(),
        )));
    }

    let body_style = if turn.is_error {
        Style::default().fg(Color::White).bg(colors.error_bg)
    } else {
        Style::default().fg(colors.fg)
    };
    lines.extend(markup_to_lines(&turn.markup, body_style, colors.code));

    if let Some(script) = &turn.script_line {
        lines.push(Line::from(Span::styled(
            script.clone(),
            Style::default().fg(colors.accent).italic(),
        )));
    }
    if let Some(context) = &turn.context_line {
        lines.push(Line::from(Span::styled(
            context.clone(),
            Style::default().fg(colors.muted),
        )));
    }

    lines.push(Line::default());
    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let colors = palette(app.view().theme);

    frame.render_widget(Block::default().style(Style::default().bg(colors.bg)), area);

    let preview_height = if app.view().preview.is_some() { 1 } else { 0 };

    // Main layout: header, chat, preview, input, footer
    let [header_area, chat_area, preview_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(preview_height),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area, &colors);
    render_chat(app, frame, chat_area, &colors);
    render_preview(app, frame, preview_area, &colors);
    render_input(app, frame, input_area, &colors);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect, colors: &Palette) {
    let mut title = vec![
        Span::styled(" Medicynth ", Style::default().fg(colors.accent).bold()),
        Span::styled(app.server_url.clone(), Style::default().fg(colors.muted)),
        Span::raw(" "),
        Span::styled(
            format!("[{}]", app.view().theme.as_str()),
            Style::default().fg(colors.muted),
        ),
    ];
    if app.view().listening {
        title.push(Span::styled(" ● listening", Style::default().fg(Color::Red).bold()));
    }
    title.push(Span::styled(
        format!(" v{}", env!("CARGO_PKG_VERSION")),
        Style::default().fg(colors.muted),
    ));

    frame.render_widget(Paragraph::new(Line::from(title)), area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect, colors: &Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.muted))
        .title(" Chat ");
    let inner = block.inner(area);
    app.chat_height = inner.height;
    app.chat_width = inner.width;

    let mut lines: Vec<Line<'static>> = Vec::new();
    for (index, turn) in app.view().turns.iter().enumerate() {
        lines.extend(turn_lines(turn, index, app, colors));
    }

    if app.view().pending_reply {
        let dots = ".".repeat(app.animation_frame as usize + 1);
        lines.push(Line::from(Span::styled("Medicynth:", Style::default().fg(colors.accent).bold())));
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(colors.muted).italic(),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, area);
}

fn render_preview(app: &App, frame: &mut Frame, area: Rect, colors: &Palette) {
    let Some(preview) = &app.view().preview else {
        return;
    };

    let line = Line::from(vec![
        Span::styled(" 📎 ", Style::default().fg(colors.accent)),
        Span::styled(preview.file_name.clone(), Style::default().fg(colors.fg).bold()),
        Span::styled(format!("  {}", preview.size), Style::default().fg(colors.muted)),
        Span::styled(format!("  {}", preview.kind.label()), Style::default().fg(colors.muted)),
        Span::styled("  (x to remove)", Style::default().fg(colors.muted)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect, colors: &Palette) {
    let (title, text) = match app.input_mode {
        InputMode::AttachPath => (" Attach file (path) ", app.path_input.clone()),
        _ => (" Message ", app.view().input.clone()),
    };

    let active = app.input_mode != InputMode::Normal && !app.view().controls_disabled;
    let border = if active { colors.accent } else { colors.muted };
    let text_style = if app.view().controls_disabled {
        Style::default().fg(colors.muted)
    } else {
        Style::default().fg(colors.fg)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title);
    let inner = block.inner(area);
    let input = Paragraph::new(text.replace('\n', " ⏎ "))
        .style(text_style)
        .block(block);
    frame.render_widget(input, area);

    if active {
        let cursor = match app.input_mode {
            InputMode::AttachPath => app.path_input.chars().count(),
            _ => app.input_cursor,
        };
        frame.set_cursor_position((inner.x + cursor_column(cursor, inner.width), inner.y));
    }
}

/// Column of the input cursor, kept inside a box `width` cells wide
fn cursor_column(cursor: usize, width: u16) -> u16 {
    u16::try_from(cursor)
        .unwrap_or(u16::MAX)
        .min(width.saturating_sub(1))
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        _ => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " INSERT ",
        InputMode::AttachPath => " ATTACH ",
    };

    let mut hints = vec![Span::styled(mode_text, mode_style)];
    let mut push = |key: &'static str, label: &'static str| {
        hints.push(Span::styled(key, key_style));
        hints.push(Span::styled(label, label_style));
    };

    match app.input_mode {
        InputMode::Normal => {
            push(" j/k ", " select ");
            push(" c ", " copy ");
            push(" a ", " attach ");
            push(" x ", " remove file ");
            if app.view().voice_available {
                push(" v ", " voice ");
            }
            push(" n ", " new chat ");
            push(" t ", " theme ");
            push(" i ", " type ");
            push(" q ", " quit ");
        }
        InputMode::Editing => {
            push(" Enter ", " send ");
            push(" Alt+Enter ", " newline ");
            if app.view().voice_available {
                push(" Ctrl+V ", " voice ");
            }
            push(" Esc ", " normal ");
        }
        InputMode::AttachPath => {
            push(" Enter ", " attach ");
            push(" Esc ", " cancel ");
        }
    }

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}
