use std::io::Stdout;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;

use crate::api::ChatApi;
use crate::config::{AppConfig, ThemePalette};
use crate::ui;

pub mod state;

pub use state::{
    ChatRow, ChatViewState, EntryMode, FocusPane, FormField, FormState, SearchState, SyncOutcome,
};

enum Action {
    Quit,
    SelectNext,
    SelectPrevious,
    NextFocus,
    PreviousFocus,
    Refresh,
    FocusSearch,
    FocusCompose,
    DeleteSelected,
    EditSelected,
}

pub struct App<A: ChatApi> {
    pub config: Arc<AppConfig>,
    api: A,
    state: ChatViewState,
    list_state: ListState,
    palette: ThemePalette,
    should_quit: bool,
    poll_interval: Duration,
}

impl<A: ChatApi> App<A> {
    /// Builds the app and performs the initial `GET /chats`.
    pub fn new(config: Arc<AppConfig>, api: A) -> Self {
        let palette = config.palette();
        let mut state = ChatViewState::new();
        if state.list(&api) == SyncOutcome::Synced {
            state.set_status_message(Some(format!("Loaded {} message(s)", state.len())));
        }
        Self {
            config,
            api,
            state,
            list_state: ListState::default(),
            palette,
            should_quit: false,
            poll_interval: Duration::from_millis(250),
        }
    }

    pub fn state(&self) -> &ChatViewState {
        &self.state
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal
                .draw(|frame| {
                    if self.state.is_empty() {
                        self.list_state.select(None);
                    } else {
                        self.list_state.select(Some(self.state.selected));
                    }
                    ui::draw_app(frame, &self.state, &mut self.list_state, &self.palette);
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            if event::poll(self.poll_interval).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(_, _) => {
                        // next draw picks up the new size
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => {
                    self.handle_action(Action::Quit);
                    return;
                }
                KeyCode::Char('r') => {
                    self.handle_action(Action::Refresh);
                    return;
                }
                KeyCode::Char('s') if self.state.focus.form_field().is_some() => {
                    self.submit_form();
                    return;
                }
                _ => {}
            }
        }

        match key.code {
            KeyCode::Tab => {
                self.handle_action(Action::NextFocus);
                return;
            }
            KeyCode::BackTab => {
                self.handle_action(Action::PreviousFocus);
                return;
            }
            _ => {}
        }

        let handled = match self.state.focus {
            FocusPane::Search => self.handle_search_key(key),
            FocusPane::List => self.handle_list_key(key),
            FocusPane::Username | FocusPane::Message => self.handle_form_key(key),
        };
        if handled {
            return;
        }

        let action = match key.code {
            KeyCode::Char('q') if is_plain(&key) => Some(Action::Quit),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::SelectNext),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::SelectPrevious),
            KeyCode::Char('/') if is_plain(&key) => Some(Action::FocusSearch),
            KeyCode::Char('a') if is_plain(&key) => Some(Action::FocusCompose),
            KeyCode::Char('d') if is_plain(&key) => Some(Action::DeleteSelected),
            KeyCode::Char('e') if is_plain(&key) => Some(Action::EditSelected),
            _ => None,
        };

        if let Some(action) = action {
            self.handle_action(action);
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::SelectNext => self.state.move_selection(1),
            Action::SelectPrevious => self.state.move_selection(-1),
            Action::NextFocus => self.state.focus = self.state.focus.next(),
            Action::PreviousFocus => self.state.focus = self.state.focus.previous(),
            Action::Refresh => {
                if self.state.list(&self.api) == SyncOutcome::Synced {
                    self.state.set_status_message(Some("Refreshed"));
                }
            }
            Action::FocusSearch => self.state.focus = FocusPane::Search,
            Action::FocusCompose => {
                self.state.focus = FocusPane::Username;
                self.state
                    .set_status_message(Some("Compose: Tab next field • Enter post • Esc back"));
            }
            Action::DeleteSelected => self.handle_delete_selected(),
            Action::EditSelected => self.handle_edit_selected(),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Enter => {
                if self.state.run_search(&self.api) == SyncOutcome::Synced {
                    let applied = &self.state.search.applied;
                    let message = if applied.is_empty() {
                        "Showing all messages".to_string()
                    } else if self.state.is_empty() {
                        format!("No messages from '{applied}'")
                    } else {
                        format!("Messages from '{applied}'")
                    };
                    self.state.set_status_message(Some(message));
                }
                self.state.focus = FocusPane::List;
                true
            }
            KeyCode::Esc => {
                self.state.focus = FocusPane::List;
                true
            }
            KeyCode::Backspace => {
                self.state.pop_search_char();
                true
            }
            KeyCode::Char(ch) if is_plain(&key) => {
                self.state.push_search_char(ch);
                true
            }
            _ => false,
        }
    }

    /// Keys for the list pane. While the selected entry is in edit mode,
    /// printable keys go to its pending text and Enter commits it.
    fn handle_list_key(&mut self, key: KeyEvent) -> bool {
        let Some(row) = self.state.selected_row() else {
            return false;
        };
        if !row.is_editing() {
            return false;
        }
        let id = row.entry.id.clone();
        match key.code {
            KeyCode::Enter => {
                if self.state.commit_edit(&self.api, &id) == SyncOutcome::Synced {
                    self.state.set_status_message(Some("Message updated"));
                }
                true
            }
            KeyCode::Backspace => {
                self.state.pop_edit_char(&id);
                true
            }
            KeyCode::Char(ch) if is_plain(&key) => {
                self.state.push_edit_char(&id, ch);
                true
            }
            _ => false,
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> bool {
        let Some(field) = self.state.focus.form_field() else {
            return false;
        };
        match key.code {
            KeyCode::Enter => {
                match field {
                    FormField::Username => self.state.focus = FocusPane::Message,
                    FormField::Message => self.submit_form(),
                }
                true
            }
            KeyCode::Esc => {
                self.state.focus = FocusPane::List;
                true
            }
            KeyCode::Backspace => {
                self.state.form.pop_char(field);
                true
            }
            KeyCode::Char(ch) if is_plain(&key) => {
                self.state.form.push_char(field, ch);
                true
            }
            _ => false,
        }
    }

    fn submit_form(&mut self) {
        match self.state.submit_form(&self.api) {
            SyncOutcome::Synced => {
                self.state.focus = FocusPane::List;
                self.state.set_status_message(Some("Message posted"));
            }
            SyncOutcome::Invalid => {
                let focus = if self.state.form.username_error.is_some() {
                    FocusPane::Username
                } else {
                    FocusPane::Message
                };
                self.state.focus = focus;
            }
            SyncOutcome::Failed | SyncOutcome::Skipped => {}
        }
    }

    fn handle_delete_selected(&mut self) {
        let Some(id) = self.state.selected_id().cloned() else {
            self.state.set_status_message(Some("No message selected"));
            return;
        };
        if self.state.delete(&self.api, &id) == SyncOutcome::Synced {
            self.state
                .set_status_message(Some(format!("Deleted message #{id}")));
        }
    }

    fn handle_edit_selected(&mut self) {
        let Some(id) = self.state.selected_id().cloned() else {
            self.state.set_status_message(Some("No message selected"));
            return;
        };
        if self.state.begin_edit(&id) {
            self.state
                .set_status_message(Some("Editing: type to change • Enter save"));
        }
    }
}

fn is_plain(key: &KeyEvent) -> bool {
    !key.modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("restoring screen state")?;
    Ok(())
}
