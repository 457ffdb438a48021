//! UseCase: ルーム作成

use std::sync::Arc;

use crate::domain::{ChatRoom, DirectoryService, Username};

use super::error::CreateRoomError;

/// ルーム作成のユースケース
pub struct CreateRoomUseCase {
    directory: Arc<dyn DirectoryService>,
}

impl CreateRoomUseCase {
    pub fn new(directory: Arc<dyn DirectoryService>) -> Self {
        Self { directory }
    }

    /// `creator` が所有するルームを作成する
    ///
    /// ルーム名は前後の空白を除いて送信する。空の名前は拒否する。
    pub async fn execute(
        &self,
        room_name: &str,
        creator: &Username,
    ) -> Result<ChatRoom, CreateRoomError> {
        let room_name = room_name.trim();
        if room_name.is_empty() {
            return Err(CreateRoomError::EmptyName);
        }

        let room = self.directory.create_room(room_name, creator).await?;
        tracing::info!("Created room {} ({})", room.name, room.id);
        Ok(room)
    }
}
