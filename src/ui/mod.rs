use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use time::macros::format_description;
use unicode_width::UnicodeWidthStr;

use crate::app::state::{ChatRow, ChatViewState, EntryMode, FocusPane, FormField};
use crate::config::ThemePalette;

const CURSOR: char = '▌';
const USERNAME_COLUMN_MAX: usize = 24;

pub fn draw_app(
    frame: &mut Frame,
    state: &ChatViewState,
    list_state: &mut ListState,
    palette: &ThemePalette,
) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(8),
            Constraint::Length(1),
        ])
        .split(frame.size());

    draw_search(frame, vertical[0], state, palette);
    draw_chat_list(frame, vertical[1], state, list_state, palette);
    draw_compose(frame, vertical[2], state, palette);
    draw_status(frame, vertical[3], state, palette);
}

fn pane_style(focused: bool, palette: &ThemePalette) -> Style {
    if focused {
        Style::default().fg(palette.accent)
    } else {
        Style::default()
    }
}

fn draw_search(frame: &mut Frame, area: Rect, state: &ChatViewState, palette: &ThemePalette) {
    let focused = state.focus == FocusPane::Search;
    let line = if state.search.query.is_empty() && !focused {
        Line::from(Span::styled(
            "Search by username... (/)",
            Style::default().fg(palette.muted),
        ))
    } else {
        Line::from(with_cursor(&state.search.query, focused))
    };
    let paragraph = Paragraph::new(line).block(
        Block::default()
            .title("Search")
            .borders(Borders::ALL)
            .border_style(pane_style(focused, palette)),
    );
    frame.render_widget(paragraph, area);
}

fn draw_chat_list(
    frame: &mut Frame,
    area: Rect,
    state: &ChatViewState,
    list_state: &mut ListState,
    palette: &ThemePalette,
) {
    let focused = state.focus == FocusPane::List;
    let mut items: Vec<ListItem> = state
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let editing_here = focused && idx == state.selected;
            ListItem::new(chat_lines(row, editing_here, palette))
        })
        .collect();
    if items.is_empty() {
        items.push(ListItem::new(Line::from(Span::styled(
            "No messages yet. Press `a` to write one.",
            Style::default().fg(palette.muted),
        ))));
    }

    let title = if state.search.applied.is_empty() {
        format!("Messages ({})", state.len())
    } else {
        format!("Messages from '{}'", state.search.applied)
    };
    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(pane_style(focused, palette)),
        )
        .highlight_style(
            Style::default()
                .bg(palette.selection_bg)
                .fg(palette.selection_fg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(list, area, list_state);
}

pub(crate) fn chat_lines(
    row: &ChatRow,
    cursor_here: bool,
    palette: &ThemePalette,
) -> Vec<Line<'static>> {
    let mut header = vec![Span::styled(
        truncate_to_width(&row.entry.username, USERNAME_COLUMN_MAX),
        Style::default()
            .fg(palette.username)
            .add_modifier(Modifier::BOLD),
    )];
    header.push(Span::styled(
        format!("  #{}", row.entry.id),
        Style::default().fg(palette.muted),
    ));

    let body = match &row.mode {
        EntryMode::Display => Line::from(format!("  {}", row.entry.text)),
        EntryMode::Editing { pending_text } => {
            header.push(Span::styled(
                "  [EDIT]",
                Style::default()
                    .fg(palette.editing)
                    .add_modifier(Modifier::BOLD),
            ));
            Line::from(vec![
                Span::styled("  ✎ ", Style::default().fg(palette.editing)),
                Span::styled(
                    with_cursor(pending_text, cursor_here),
                    Style::default().add_modifier(Modifier::UNDERLINED),
                ),
            ])
        }
    };
    vec![Line::from(header), body]
}

fn draw_compose(frame: &mut Frame, area: Rect, state: &ChatViewState, palette: &ThemePalette) {
    let form_focused = state.focus.form_field().is_some();
    let mut lines = Vec::with_capacity(6);
    for (label, field) in [
        ("Username: ", FormField::Username),
        ("Message:  ", FormField::Message),
    ] {
        let focused = state.focus.form_field() == Some(field);
        let value = state.form.value(field);
        let label_style = if focused {
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.muted)
        };
        lines.push(Line::from(vec![
            Span::styled(label, label_style),
            Span::raw(with_cursor(value, focused)),
        ]));
        if let Some(error) = state.form.error(field) {
            lines.push(Line::from(Span::styled(
                format!("          {error}"),
                Style::default().fg(palette.error),
            )));
        }
    }

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title("New message (Enter to post)")
                .borders(Borders::ALL)
                .border_style(pane_style(form_focused, palette)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn draw_status(frame: &mut Frame, area: Rect, state: &ChatViewState, palette: &ThemePalette) {
    let mut spans = Vec::new();
    if let Some(synced) = state.last_synced_at {
        let stamp = synced
            .format(&format_description!("[hour]:[minute]:[second]"))
            .unwrap_or_else(|_| synced.unix_timestamp().to_string());
        spans.push(Span::styled(
            format!("synced {stamp} "),
            Style::default().fg(palette.muted),
        ));
    }
    if let Some(message) = &state.status_message {
        spans.push(Span::raw(format!("{message} ")));
    }
    spans.push(Span::styled(
        key_hints(state),
        Style::default().fg(palette.muted),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn key_hints(state: &ChatViewState) -> &'static str {
    match state.focus {
        FocusPane::Search => "• Enter search • Esc back",
        FocusPane::List => {
            if state.selected_row().map(ChatRow::is_editing).unwrap_or(false) {
                "• Enter save • ↑/↓ move"
            } else {
                "• j/k move • e edit • d delete • a compose • / search • ^R refresh • q quit"
            }
        }
        FocusPane::Username | FocusPane::Message => "• Tab next • Enter/^S post • Esc back",
    }
}

fn with_cursor(value: &str, focused: bool) -> String {
    let mut display = value.to_string();
    if focused {
        display.push(CURSOR);
    }
    display
}

fn truncate_to_width(value: &str, max_width: usize) -> String {
    if value.width() <= max_width {
        return value.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for ch in value.chars() {
        let ch_width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + ch_width + 1 > max_width {
            break;
        }
        width += ch_width;
        out.push(ch);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{chat, RecordingApi};
    use crate::api::ChatId;
    use crate::config::{AppConfig, ThemeName};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn render(state: &ChatViewState) -> String {
        let palette = AppConfig::default().palette();
        let mut terminal = Terminal::new(TestBackend::new(90, 24)).expect("test terminal");
        let mut list_state = ListState::default();
        if !state.is_empty() {
            list_state.select(Some(state.selected));
        }
        terminal
            .draw(|frame| draw_app(frame, state, &mut list_state, &palette))
            .expect("draw");
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn renders_rows_and_edit_marker() {
        let api = RecordingApi::with_chats(vec![chat(1, "ana", "hi"), chat(2, "ben", "yo")]);
        let mut state = ChatViewState::new();
        state.list(&api);
        state.update_edit_buffer(&ChatId::Number(2), "draft");

        let screen = render(&state);

        assert!(screen.contains("ana"));
        assert!(screen.contains("hi"));
        assert!(screen.contains("[EDIT]"));
        assert!(screen.contains("draft"));
        assert!(screen.contains("Messages (2)"));
    }

    #[test]
    fn list_title_follows_applied_search_only() {
        let api = RecordingApi::with_chats(vec![chat(1, "ana", "hi"), chat(2, "ben", "yo")]);
        let mut state = ChatViewState::new();
        state.list(&api);
        state.focus = FocusPane::Search;
        state.push_search_char('b');
        state.push_search_char('e');

        let typing = render(&state);
        assert!(typing.contains("Messages (2)"));
        assert!(!typing.contains("Messages from"));

        state.push_search_char('n');
        state.run_search(&api);

        assert!(render(&state).contains("Messages from 'ben'"));
    }

    #[test]
    fn renders_validation_messages() {
        let api = RecordingApi::default();
        let mut state = ChatViewState::new();
        state.focus = FocusPane::Username;
        state.submit_form(&api);

        let screen = render(&state);

        assert!(screen.contains("Username is required"));
        assert!(screen.contains("Message is required"));
    }

    #[test]
    fn renders_empty_placeholder() {
        let screen = render(&ChatViewState::new());
        assert!(screen.contains("No messages yet"));
    }

    #[test]
    fn long_usernames_are_truncated() {
        let name = "x".repeat(40);
        let truncated = truncate_to_width(&name, 10);
        assert_eq!(truncated.width(), 10);
        assert!(truncated.ends_with('…'));
        assert_eq!(truncate_to_width("ana", 10), "ana");
    }

    #[test]
    fn editing_row_shows_cursor_only_when_selected() {
        let palette = AppConfig {
            theme: ThemeName::HighContrast,
            ..AppConfig::default()
        }
        .palette();
        let mut row = ChatRow {
            entry: chat(1, "ana", "hi"),
            mode: EntryMode::Editing {
                pending_text: "bye".into(),
            },
        };
        let text = |lines: Vec<Line<'static>>| {
            lines[1]
                .spans
                .iter()
                .map(|span| span.content.clone().into_owned())
                .collect::<String>()
        };

        assert!(text(chat_lines(&row, true, &palette)).contains("bye▌"));
        assert!(!text(chat_lines(&row, false, &palette)).contains('▌'));

        row.mode = EntryMode::Display;
        assert_eq!(text(chat_lines(&row, true, &palette)), "  hi");
    }
}
