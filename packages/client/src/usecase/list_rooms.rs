//! UseCase: ルーム一覧の取得

use std::sync::Arc;

use crate::domain::{ChatRoom, DirectoryError, DirectoryService, Username};

/// ルーム一覧取得のユースケース
pub struct ListRoomsUseCase {
    directory: Arc<dyn DirectoryService>,
}

impl ListRoomsUseCase {
    pub fn new(directory: Arc<dyn DirectoryService>) -> Self {
        Self { directory }
    }

    /// 全てのルームを ID 順で取得する
    pub async fn execute(&self) -> Result<Vec<ChatRoom>, DirectoryError> {
        let mut rooms = self.directory.list_rooms().await?;
        rooms.sort_by_key(|room| room.id);
        Ok(rooms)
    }

    /// ユーザーが参加しているルームを ID 順で取得する
    pub async fn execute_for_user(
        &self,
        username: &Username,
    ) -> Result<Vec<ChatRoom>, DirectoryError> {
        let mut rooms = self.directory.list_user_rooms(username).await?;
        rooms.sort_by_key(|room| room.id);
        Ok(rooms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{RoomId, directory::MockDirectoryService},
        usecase::testing::username,
    };

    fn room(id: i64, name: &str, participants: &[&str]) -> ChatRoom {
        ChatRoom {
            id: RoomId::new(id),
            name: name.to_string(),
            created_at: None,
            participants: participants.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_list_rooms_sorted_by_id() {
        // テスト項目: ルーム一覧は ID 順に並べて返される
        // given (前提条件):
        let mut directory = MockDirectoryService::new();
        directory.expect_list_rooms().times(1).returning(|| {
            Ok(vec![
                room(9, "random", &[]),
                room(3, "general", &["alice", "bob"]),
            ])
        });
        let usecase = ListRoomsUseCase::new(Arc::new(directory));

        // when (操作):
        let rooms = usecase.execute().await.unwrap();

        // then (期待する結果):
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].name, "general");
        assert_eq!(rooms[0].participant_count(), 2);
        assert_eq!(rooms[1].name, "random");
    }

    #[tokio::test]
    async fn test_list_user_rooms_passes_username() {
        // テスト項目: ユーザーの参加ルーム一覧はそのユーザー名で問い合わせる
        // given (前提条件):
        let mut directory = MockDirectoryService::new();
        directory
            .expect_list_user_rooms()
            .withf(|name| name.as_str() == "alice")
            .times(1)
            .returning(|_| Ok(vec![room(3, "general", &["alice"])]));
        let usecase = ListRoomsUseCase::new(Arc::new(directory));

        // when (操作):
        let rooms = usecase.execute_for_user(&username("alice")).await.unwrap();

        // then (期待する結果):
        assert_eq!(rooms.len(), 1);
        assert!(rooms[0].has_participant(&username("alice")));
    }

    #[tokio::test]
    async fn test_list_rooms_failure_is_returned() {
        // テスト項目: ディレクトリサービスのエラーはそのまま呼び出し元に返される
        // given (前提条件):
        let mut directory = MockDirectoryService::new();
        directory
            .expect_list_rooms()
            .returning(|| Err(DirectoryError::Network("connection refused".to_string())));
        let usecase = ListRoomsUseCase::new(Arc::new(directory));

        // when (操作):
        let result = usecase.execute().await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(DirectoryError::Network("connection refused".to_string()))
        );
    }
}
