//! Directory/History service interface.
//!
//! Stateless request/response calls against the remote chat service. Failures
//! are returned to the caller; nothing here retries.

use async_trait::async_trait;

use super::{
    entity::{ChatMessage, ChatRoom},
    error::DirectoryError,
    value_object::{RoomId, Username},
};

/// Directory/History service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// List every room
    async fn list_rooms(&self) -> Result<Vec<ChatRoom>, DirectoryError>;

    /// List the rooms the user is a member of
    async fn list_user_rooms(&self, username: &Username) -> Result<Vec<ChatRoom>, DirectoryError>;

    /// Fetch one room
    async fn get_room(&self, room_id: RoomId) -> Result<ChatRoom, DirectoryError>;

    /// Create a room owned by `creator`
    async fn create_room(
        &self,
        room_name: &str,
        creator: &Username,
    ) -> Result<ChatRoom, DirectoryError>;

    /// Add a membership record (not a channel subscription)
    async fn join_room(&self, room_id: RoomId, username: &Username) -> Result<(), DirectoryError>;

    /// Remove a membership record
    async fn leave_room(&self, room_id: RoomId, username: &Username)
    -> Result<(), DirectoryError>;

    /// Most recent messages of a room, most-recent-first
    async fn recent_messages(
        &self,
        room_id: RoomId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, DirectoryError>;

    /// Every message of a room, most-recent-first
    async fn all_messages(&self, room_id: RoomId) -> Result<Vec<ChatMessage>, DirectoryError>;
}
