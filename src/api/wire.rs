//! JSON bodies exchanged with the `/chats` collection resource.

use serde::{Deserialize, Serialize};

use super::ChatEntry;

pub const COLLECTION_SEGMENT: &str = "chats";

/// Response to `GET /chats` and `POST /chats`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatListResponse {
    pub chat_list: Vec<ChatEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewChatBody<'a> {
    pub username: &'a str,
    pub text: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditChatBody<'a> {
    pub text: &'a str,
}
