use std::cell::{Cell, RefCell};

use super::{ApiError, ChatApi, ChatEntry, ChatId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Find(String),
    Create { username: String, text: String },
    Update { id: ChatId, text: String },
    Delete(ChatId),
}

/// In-memory collection that records every call made against it.
#[derive(Debug, Default)]
pub struct RecordingApi {
    chats: RefCell<Vec<ChatEntry>>,
    next_id: Cell<i64>,
    calls: RefCell<Vec<Call>>,
    failing: Cell<bool>,
    list_failing: Cell<bool>,
}

impl RecordingApi {
    pub fn with_chats(chats: Vec<ChatEntry>) -> Self {
        let next_id = chats
            .iter()
            .filter_map(|chat| match chat.id {
                ChatId::Number(id) => Some(id),
                ChatId::Text(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            chats: RefCell::new(chats),
            next_id: Cell::new(next_id),
            ..Self::default()
        }
    }

    /// Every subsequent call answers with a 500.
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    /// Only `GET /chats` answers with a 500.
    pub fn set_list_failing(&self, failing: bool) {
        self.list_failing.set(failing);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn server_chats(&self) -> Vec<ChatEntry> {
        self.chats.borrow().clone()
    }

    fn record(&self, call: Call, method: &'static str, path: String) -> Result<(), ApiError> {
        self.calls.borrow_mut().push(call);
        if self.failing.get() {
            return Err(status(method, path, 500));
        }
        Ok(())
    }
}

pub fn chat(id: i64, username: &str, text: &str) -> ChatEntry {
    ChatEntry {
        id: ChatId::Number(id),
        username: username.to_string(),
        text: text.to_string(),
    }
}

fn status(method: &'static str, path: String, status: u16) -> ApiError {
    ApiError::Status {
        method,
        url: format!("http://mock{path}"),
        status,
    }
}

impl ChatApi for RecordingApi {
    fn list_chats(&self) -> Result<Vec<ChatEntry>, ApiError> {
        self.record(Call::List, "GET", "/chats".into())?;
        if self.list_failing.get() {
            return Err(status("GET", "/chats".into(), 500));
        }
        Ok(self.server_chats())
    }

    fn find_by_username(&self, username: &str) -> Result<ChatEntry, ApiError> {
        let path = format!("/chats/{username}");
        self.record(Call::Find(username.to_string()), "GET", path.clone())?;
        self.chats
            .borrow()
            .iter()
            .find(|chat| chat.username == username)
            .cloned()
            .ok_or_else(|| status("GET", path, 404))
    }

    fn create_chat(&self, username: &str, text: &str) -> Result<Vec<ChatEntry>, ApiError> {
        self.record(
            Call::Create {
                username: username.to_string(),
                text: text.to_string(),
            },
            "POST",
            "/chats".into(),
        )?;
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.chats.borrow_mut().push(chat(id, username, text));
        Ok(self.server_chats())
    }

    fn update_chat(&self, id: &ChatId, text: &str) -> Result<(), ApiError> {
        let path = format!("/chats/{id}");
        self.record(
            Call::Update {
                id: id.clone(),
                text: text.to_string(),
            },
            "PUT",
            path.clone(),
        )?;
        let mut chats = self.chats.borrow_mut();
        let chat = chats
            .iter_mut()
            .find(|chat| &chat.id == id)
            .ok_or_else(|| status("PUT", path, 404))?;
        chat.text = text.to_string();
        Ok(())
    }

    fn delete_chat(&self, id: &ChatId) -> Result<(), ApiError> {
        let path = format!("/chats/{id}");
        self.record(Call::Delete(id.clone()), "DELETE", path.clone())?;
        let mut chats = self.chats.borrow_mut();
        let before = chats.len();
        chats.retain(|chat| &chat.id != id);
        if chats.len() == before {
            return Err(status("DELETE", path, 404));
        }
        Ok(())
    }
}
