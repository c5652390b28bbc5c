use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod http;
pub mod wire;

#[cfg(test)]
pub(crate) mod testing;

pub use http::HttpChatClient;

/// Server-assigned chat identifier.
///
/// The collection resource hands out either numeric or string ids; both are
/// kept in the shape the server used so they round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Number(id) => write!(f, "{id}"),
            ChatId::Text(id) => f.write_str(id),
        }
    }
}

impl FromStr for ChatId {
    type Err = Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        Ok(match trimmed.parse::<i64>() {
            Ok(id) => ChatId::Number(id),
            Err(_) => ChatId::Text(trimmed.to_string()),
        })
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        ChatId::Number(id)
    }
}

impl From<&str> for ChatId {
    fn from(id: &str) -> Self {
        ChatId::Text(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub id: ChatId,
    pub username: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// The configured base URL cannot address the collection resource.
    #[error("invalid server url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),

    /// The request never produced a response.
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{method} {url} returned status {status}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
    },

    /// The response body did not have the expected shape.
    #[error("decoding response from {url} failed: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}

/// Operations the chat collection resource supports.
///
/// Every view-model operation goes through this trait so the state can be
/// driven by [`HttpChatClient`] in the app and by an in-memory fake in tests.
pub trait ChatApi {
    /// `GET /chats`
    fn list_chats(&self) -> Result<Vec<ChatEntry>, ApiError>;

    /// `GET /chats/:username`
    fn find_by_username(&self, username: &str) -> Result<ChatEntry, ApiError>;

    /// `POST /chats`, answered with the updated collection.
    fn create_chat(&self, username: &str, text: &str) -> Result<Vec<ChatEntry>, ApiError>;

    /// `PUT /chats/:id`; the acknowledgment body is ignored.
    fn update_chat(&self, id: &ChatId, text: &str) -> Result<(), ApiError>;

    /// `DELETE /chats/:id`; the acknowledgment body is ignored.
    fn delete_chat(&self, id: &ChatId) -> Result<(), ApiError>;
}

impl<T: ChatApi + ?Sized> ChatApi for &T {
    fn list_chats(&self) -> Result<Vec<ChatEntry>, ApiError> {
        (**self).list_chats()
    }

    fn find_by_username(&self, username: &str) -> Result<ChatEntry, ApiError> {
        (**self).find_by_username(username)
    }

    fn create_chat(&self, username: &str, text: &str) -> Result<Vec<ChatEntry>, ApiError> {
        (**self).create_chat(username, text)
    }

    fn update_chat(&self, id: &ChatId, text: &str) -> Result<(), ApiError> {
        (**self).update_chat(id, text)
    }

    fn delete_chat(&self, id: &ChatId) -> Result<(), ApiError> {
        (**self).delete_chat(id)
    }
}
