use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::{
    domain::{ChatMessage, ChatRoom, DirectoryError, DirectoryService, RoomId, Username},
    infrastructure::dto::{http as dto, websocket::ChatMessage as ChatMessageDto},
};

use super::DirectoryConfig;

/// Directory/history client over the chat service REST API
#[derive(Debug, Clone)]
pub struct HttpDirectoryClient {
    http: Client,
    base_url: Url,
}

impl HttpDirectoryClient {
    pub fn new(config: DirectoryConfig) -> Result<Self, DirectoryError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| DirectoryError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(DirectoryError::InvalidUrl(config.base_url));
        }

        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DirectoryError::Network(e.to_string()))?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL with the given path segments appended (each one percent-encoded)
    fn endpoint<I>(&self, segments: I) -> Url
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        // checked in `new`: the base URL can carry a path
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, DirectoryError> {
        tracing::debug!("GET {}", url);
        let response = self.http.get(url).send().await.map_err(network_error)?;
        read_json(response).await
    }

    async fn get_messages(
        &self,
        url: Url,
        limit: Option<usize>,
    ) -> Result<Vec<ChatMessage>, DirectoryError> {
        tracing::debug!("GET {} (limit: {:?})", url, limit);
        let mut request = self.http.get(url);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        let response = request.send().await.map_err(network_error)?;
        let messages: Vec<ChatMessageDto> = read_json(response).await?;

        messages
            .into_iter()
            .map(|dto| {
                ChatMessage::try_from(dto).map_err(|e| DirectoryError::Decode(e.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl DirectoryService for HttpDirectoryClient {
    async fn list_rooms(&self) -> Result<Vec<ChatRoom>, DirectoryError> {
        let rooms: Vec<dto::ChatRoomDto> = self.get_json(self.endpoint(["rooms"])).await?;
        Ok(rooms.into_iter().map(ChatRoom::from).collect())
    }

    async fn list_user_rooms(&self, username: &Username) -> Result<Vec<ChatRoom>, DirectoryError> {
        let url = self.endpoint(["rooms", "user", username.as_str()]);
        let rooms: Vec<dto::ChatRoomDto> = self.get_json(url).await?;
        Ok(rooms.into_iter().map(ChatRoom::from).collect())
    }

    async fn get_room(&self, room_id: RoomId) -> Result<ChatRoom, DirectoryError> {
        let url = self.endpoint(["rooms".to_string(), room_id.to_string()]);
        let room: dto::ChatRoomDto = self.get_json(url).await?;
        Ok(room.into())
    }

    async fn create_room(
        &self,
        room_name: &str,
        creator: &Username,
    ) -> Result<ChatRoom, DirectoryError> {
        let url = self.endpoint(["rooms"]);
        let body = dto::CreateRoomRequest {
            room_name: room_name.to_string(),
            creator: creator.as_str().to_string(),
        };
        tracing::debug!("POST {} (room: {})", url, room_name);

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;
        let room: dto::ChatRoomDto = read_json(response).await?;
        Ok(room.into())
    }

    async fn join_room(&self, room_id: RoomId, username: &Username) -> Result<(), DirectoryError> {
        let url = self.endpoint([
            "rooms".to_string(),
            room_id.to_string(),
            "participants".to_string(),
        ]);
        let body = dto::JoinRoomRequest {
            username: username.as_str().to_string(),
        };
        tracing::debug!("POST {} (user: {})", url, username);

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;
        check_status(response).map(|_| ())
    }

    async fn leave_room(
        &self,
        room_id: RoomId,
        username: &Username,
    ) -> Result<(), DirectoryError> {
        let url = self.endpoint([
            "rooms".to_string(),
            room_id.to_string(),
            "participants".to_string(),
            username.as_str().to_string(),
        ]);
        tracing::debug!("DELETE {}", url);

        let response = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(network_error)?;
        check_status(response).map(|_| ())
    }

    async fn recent_messages(
        &self,
        room_id: RoomId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, DirectoryError> {
        let url = self.endpoint([
            "messages".to_string(),
            room_id.to_string(),
            "recent".to_string(),
        ]);
        self.get_messages(url, Some(limit)).await
    }

    async fn all_messages(&self, room_id: RoomId) -> Result<Vec<ChatMessage>, DirectoryError> {
        let url = self.endpoint(["messages".to_string(), room_id.to_string()]);
        self.get_messages(url, None).await
    }
}

fn network_error(e: reqwest::Error) -> DirectoryError {
    DirectoryError::Network(e.to_string())
}

fn check_status(response: Response) -> Result<Response, DirectoryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    tracing::warn!("{} answered with status {}", url, status);
    if status == StatusCode::NOT_FOUND {
        Err(DirectoryError::NotFound(url))
    } else {
        Err(DirectoryError::Status {
            status: status.as_u16(),
            url,
        })
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, DirectoryError> {
    let response = check_status(response)?;
    let text = response.text().await.map_err(network_error)?;
    serde_json::from_str(&text).map_err(|e| DirectoryError::Decode(e.to_string()))
}
