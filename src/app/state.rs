use std::collections::HashMap;

use time::OffsetDateTime;
use unicode_segmentation::UnicodeSegmentation;

use crate::api::{ChatApi, ChatEntry, ChatId};

pub const USERNAME_REQUIRED: &str = "Username is required";
pub const MESSAGE_REQUIRED: &str = "Message is required";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Search,
    List,
    Username,
    Message,
}

impl FocusPane {
    pub fn next(self) -> Self {
        match self {
            FocusPane::Search => FocusPane::List,
            FocusPane::List => FocusPane::Username,
            FocusPane::Username => FocusPane::Message,
            FocusPane::Message => FocusPane::Search,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            FocusPane::Search => FocusPane::Message,
            FocusPane::List => FocusPane::Search,
            FocusPane::Username => FocusPane::List,
            FocusPane::Message => FocusPane::Username,
        }
    }

    pub fn form_field(self) -> Option<FormField> {
        match self {
            FocusPane::Username => Some(FormField::Username),
            FocusPane::Message => Some(FormField::Message),
            FocusPane::Search | FocusPane::List => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Username,
    Message,
}

/// Per-entry display/edit toggle. Editing carries the text typed so far.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EntryMode {
    #[default]
    Display,
    Editing {
        pending_text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRow {
    pub entry: ChatEntry,
    pub mode: EntryMode,
}

impl ChatRow {
    fn new(entry: ChatEntry) -> Self {
        Self {
            entry,
            mode: EntryMode::Display,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, EntryMode::Editing { .. })
    }

    pub fn pending_text(&self) -> Option<&str> {
        match &self.mode {
            EntryMode::Editing { pending_text } => Some(pending_text),
            EntryMode::Display => None,
        }
    }

    fn set_pending_text(&mut self, pending_text: String) {
        self.mode = if pending_text.is_empty() {
            EntryMode::Display
        } else {
            EntryMode::Editing { pending_text }
        };
    }

    fn pending_text_mut(&mut self) -> Option<&mut String> {
        match &mut self.mode {
            EntryMode::Editing { pending_text } => Some(pending_text),
            EntryMode::Display => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub username: String,
    pub text: String,
    pub username_error: Option<String>,
    pub text_error: Option<String>,
}

impl FormState {
    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Username => &self.username,
            FormField::Message => &self.text,
        }
    }

    pub fn error(&self, field: FormField) -> Option<&str> {
        match field {
            FormField::Username => self.username_error.as_deref(),
            FormField::Message => self.text_error.as_deref(),
        }
    }

    /// Editing a field clears its validation message.
    pub fn push_char(&mut self, field: FormField, ch: char) {
        let (value, error) = self.field_mut(field);
        value.push(ch);
        *error = None;
    }

    pub fn pop_char(&mut self, field: FormField) -> bool {
        let (value, error) = self.field_mut(field);
        *error = None;
        pop_grapheme(value)
    }

    pub fn set_value(&mut self, field: FormField, value: impl Into<String>) {
        let (current, error) = self.field_mut(field);
        *current = value.into();
        *error = None;
    }

    pub fn has_errors(&self) -> bool {
        self.username_error.is_some() || self.text_error.is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn field_mut(&mut self, field: FormField) -> (&mut String, &mut Option<String>) {
        match field {
            FormField::Username => (&mut self.username, &mut self.username_error),
            FormField::Message => (&mut self.text, &mut self.text_error),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub query: String,
    /// Username filter behind the rows on screen; empty when showing all.
    pub applied: String,
}

/// What a view-model operation did with the remote collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The round trip succeeded and its result was applied.
    Synced,
    /// Validation failed before any request was sent.
    Invalid,
    /// The request failed; the error was logged and the state left alone.
    Failed,
    /// Nothing to send for the given id.
    Skipped,
}

/// The chat list view-model.
///
/// Every operation that talks to the server takes the [`ChatApi`] as an
/// argument, applies the response to `self`, and reports a [`SyncOutcome`].
/// Request failures are logged and otherwise ignored.
#[derive(Debug, Clone)]
pub struct ChatViewState {
    pub rows: Vec<ChatRow>,
    pub selected: usize,
    pub focus: FocusPane,
    pub form: FormState,
    pub search: SearchState,
    pub status_message: Option<String>,
    pub last_synced_at: Option<OffsetDateTime>,
}

impl Default for ChatViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatViewState {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            selected: 0,
            focus: FocusPane::List,
            form: FormState::default(),
            search: SearchState::default(),
            status_message: None,
            last_synced_at: None,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ChatEntry> {
        self.rows.iter().map(|row| &row.entry)
    }

    pub fn row(&self, id: &ChatId) -> Option<&ChatRow> {
        self.rows.iter().find(|row| &row.entry.id == id)
    }

    fn row_mut(&mut self, id: &ChatId) -> Option<&mut ChatRow> {
        self.rows.iter_mut().find(|row| &row.entry.id == id)
    }

    pub fn selected_row(&self) -> Option<&ChatRow> {
        self.rows.get(self.selected)
    }

    pub fn selected_id(&self) -> Option<&ChatId> {
        self.selected_row().map(|row| &row.entry.id)
    }

    pub fn select_by_id(&mut self, id: &ChatId) {
        if let Some(idx) = self.rows.iter().position(|row| &row.entry.id == id) {
            self.selected = idx;
        } else {
            self.normalize_selection();
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let last = self.rows.len() as isize - 1;
        let next = (self.selected as isize + delta).clamp(0, last);
        self.selected = next as usize;
    }

    pub fn set_status_message<S: Into<String>>(&mut self, message: Option<S>) {
        self.status_message = message.map(Into::into);
    }

    /// `GET /chats`, replacing the whole list.
    pub fn list<A: ChatApi + ?Sized>(&mut self, api: &A) -> SyncOutcome {
        match api.list_chats() {
            Ok(entries) => {
                self.replace_entries(entries);
                SyncOutcome::Synced
            }
            Err(err) => {
                tracing::error!(?err, "failed to fetch chat list");
                SyncOutcome::Failed
            }
        }
    }

    /// Show only the chat posted by `query`; an empty query lists everything.
    ///
    /// A 404 from the server means nobody by that name has posted, which shows
    /// as an empty list rather than a failure.
    pub fn search<A: ChatApi + ?Sized>(&mut self, api: &A, query: &str) -> SyncOutcome {
        let username = query.trim();
        if username.is_empty() {
            return self.list(api);
        }
        match api.find_by_username(username) {
            Ok(entry) => {
                self.replace_entries(vec![entry]);
                self.search.applied = username.to_string();
                SyncOutcome::Synced
            }
            Err(err) if err.is_not_found() => {
                tracing::info!(username, "no chat found for username");
                self.replace_entries(Vec::new());
                self.search.applied = username.to_string();
                SyncOutcome::Synced
            }
            Err(err) => {
                tracing::error!(?err, username, "failed to search chats");
                SyncOutcome::Failed
            }
        }
    }

    pub fn run_search<A: ChatApi + ?Sized>(&mut self, api: &A) -> SyncOutcome {
        let query = self.search.query.clone();
        self.search(api, &query)
    }

    pub fn push_search_char(&mut self, ch: char) {
        self.search.query.push(ch);
    }

    pub fn pop_search_char(&mut self) -> bool {
        pop_grapheme(&mut self.search.query)
    }

    /// Post a new chat. Blank (or whitespace-only) fields are rejected locally
    /// with a message on each offending field and nothing is sent.
    pub fn create<A: ChatApi + ?Sized>(
        &mut self,
        api: &A,
        username: &str,
        text: &str,
    ) -> SyncOutcome {
        self.form.username_error = username
            .trim()
            .is_empty()
            .then(|| USERNAME_REQUIRED.to_string());
        self.form.text_error = text
            .trim()
            .is_empty()
            .then(|| MESSAGE_REQUIRED.to_string());
        if self.form.has_errors() {
            return SyncOutcome::Invalid;
        }

        match api.create_chat(username, text) {
            Ok(entries) => {
                self.replace_entries(entries);
                self.form.clear();
                SyncOutcome::Synced
            }
            Err(err) => {
                tracing::error!(?err, username, "failed to post chat message");
                SyncOutcome::Failed
            }
        }
    }

    pub fn submit_form<A: ChatApi + ?Sized>(&mut self, api: &A) -> SyncOutcome {
        let username = self.form.username.clone();
        let text = self.form.text.clone();
        self.create(api, &username, &text)
    }

    /// Delete on the server, then refetch the list. A failed delete leaves the
    /// stale entry in place until the next successful refresh.
    pub fn delete<A: ChatApi + ?Sized>(&mut self, api: &A, id: &ChatId) -> SyncOutcome {
        if let Err(err) = api.delete_chat(id) {
            tracing::error!(?err, %id, "failed to delete chat");
            return SyncOutcome::Failed;
        }
        self.list(api)
    }

    /// Switch an entry into edit mode seeded with its current text. Returns
    /// `false` for unknown ids, entries already being edited, and entries
    /// whose text is empty (an empty buffer means display mode).
    pub fn begin_edit(&mut self, id: &ChatId) -> bool {
        let Some(row) = self.row_mut(id) else {
            return false;
        };
        if row.is_editing() {
            return false;
        }
        let seed = row.entry.text.clone();
        row.set_pending_text(seed);
        row.is_editing()
    }

    /// Replace the pending text for `id`. Empty text returns the entry to
    /// display mode.
    pub fn update_edit_buffer(&mut self, id: &ChatId, text: impl Into<String>) -> bool {
        let Some(row) = self.row_mut(id) else {
            return false;
        };
        row.set_pending_text(text.into());
        true
    }

    pub fn push_edit_char(&mut self, id: &ChatId, ch: char) -> bool {
        let Some(pending) = self.row_mut(id).and_then(ChatRow::pending_text_mut) else {
            return false;
        };
        pending.push(ch);
        true
    }

    /// Pop the last grapheme of the pending text. Popping the final one
    /// leaves edit mode.
    pub fn pop_edit_char(&mut self, id: &ChatId) -> bool {
        let Some(row) = self.row_mut(id) else {
            return false;
        };
        let Some(mut pending) = row.pending_text().map(str::to_owned) else {
            return false;
        };
        let popped = pop_grapheme(&mut pending);
        row.set_pending_text(pending);
        popped
    }

    /// Send the pending text for `id`. On acknowledgment the entry is patched
    /// locally (no refetch) and returns to display mode; on failure it stays
    /// in edit mode with the unsent text.
    pub fn commit_edit<A: ChatApi + ?Sized>(&mut self, api: &A, id: &ChatId) -> SyncOutcome {
        let Some(pending) = self
            .row(id)
            .and_then(ChatRow::pending_text)
            .map(str::to_owned)
        else {
            return SyncOutcome::Skipped;
        };

        match api.update_chat(id, &pending) {
            Ok(()) => {
                if let Some(row) = self.row_mut(id) {
                    row.entry.text = pending;
                    row.mode = EntryMode::Display;
                }
                SyncOutcome::Synced
            }
            Err(err) => {
                tracing::error!(?err, %id, "failed to save chat edit");
                SyncOutcome::Failed
            }
        }
    }

    /// Replace the list with a server response. Entries still present keep
    /// any pending edit text, and the selection follows the selected id.
    pub fn replace_entries(&mut self, entries: Vec<ChatEntry>) {
        let selected_id = self.selected_id().cloned();
        let mut pending: HashMap<ChatId, String> = self
            .rows
            .drain(..)
            .filter_map(|row| match row.mode {
                EntryMode::Editing { pending_text } => Some((row.entry.id, pending_text)),
                EntryMode::Display => None,
            })
            .collect();

        self.rows = entries
            .into_iter()
            .map(|entry| {
                let mut row = ChatRow::new(entry);
                if let Some(pending_text) = pending.remove(&row.entry.id) {
                    row.mode = EntryMode::Editing { pending_text };
                }
                row
            })
            .collect();

        match selected_id {
            Some(id) => self.select_by_id(&id),
            None => self.normalize_selection(),
        }
        self.search.applied.clear();
        self.last_synced_at = Some(now());
    }

    fn normalize_selection(&mut self) {
        if self.rows.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.rows.len() {
            self.selected = self.rows.len() - 1;
        }
    }
}

fn pop_grapheme(text: &mut String) -> bool {
    let Some((idx, _)) = text.grapheme_indices(true).next_back() else {
        return false;
    };
    text.truncate(idx);
    true
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}
