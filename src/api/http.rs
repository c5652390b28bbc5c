use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;

use super::wire::{ChatListResponse, EditChatBody, NewChatBody, COLLECTION_SEGMENT};
use super::{ApiError, ChatApi, ChatEntry, ChatId};
use crate::config::ServerOptions;

/// [`ChatApi`] over blocking HTTP against `<base_url>/chats`.
#[derive(Debug, Clone)]
pub struct HttpChatClient {
    http: Client,
    base_url: Url,
}

impl HttpChatClient {
    pub fn new(options: &ServerOptions) -> Result<Self, ApiError> {
        let raw = options.base_url.trim();
        let base_url = Url::parse(raw).map_err(|err| ApiError::InvalidUrl {
            url: raw.to_string(),
            reason: err.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl {
                url: raw.to_string(),
                reason: "url cannot carry a path".to_string(),
            });
        }
        let http = Client::builder()
            .timeout(options.request_timeout())
            .connect_timeout(options.connect_timeout())
            .build()
            .map_err(|err| ApiError::ClientBuild(err.to_string()))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn collection_url(&self, member: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(COLLECTION_SEGMENT);
            if let Some(member) = member {
                segments.push(member);
            }
        }
        url
    }

    fn execute(
        &self,
        request: RequestBuilder,
        method: &'static str,
        url: &Url,
    ) -> Result<Response, ApiError> {
        tracing::debug!(method, %url, "sending chat request");
        let response = request.send().map_err(|source| ApiError::Transport {
            method,
            url: url.to_string(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                method,
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    fn decode_list(response: Response, url: &Url) -> Result<Vec<ChatEntry>, ApiError> {
        let body: ChatListResponse = response.json().map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })?;
        Ok(body.chat_list)
    }
}

impl ChatApi for HttpChatClient {
    fn list_chats(&self) -> Result<Vec<ChatEntry>, ApiError> {
        let url = self.collection_url(None);
        let response = self.execute(self.http.get(url.clone()), "GET", &url)?;
        Self::decode_list(response, &url)
    }

    fn find_by_username(&self, username: &str) -> Result<ChatEntry, ApiError> {
        let url = self.collection_url(Some(username));
        let response = self.execute(self.http.get(url.clone()), "GET", &url)?;
        response.json().map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    fn create_chat(&self, username: &str, text: &str) -> Result<Vec<ChatEntry>, ApiError> {
        let url = self.collection_url(None);
        let request = self
            .http
            .post(url.clone())
            .json(&NewChatBody { username, text });
        let response = self.execute(request, "POST", &url)?;
        Self::decode_list(response, &url)
    }

    fn update_chat(&self, id: &ChatId, text: &str) -> Result<(), ApiError> {
        let url = self.collection_url(Some(&id.to_string()));
        let request = self.http.put(url.clone()).json(&EditChatBody { text });
        self.execute(request, "PUT", &url)?;
        Ok(())
    }

    fn delete_chat(&self, id: &ChatId) -> Result<(), ApiError> {
        let url = self.collection_url(Some(&id.to_string()));
        self.execute(self.http.delete(url.clone()), "DELETE", &url)?;
        Ok(())
    }
}
