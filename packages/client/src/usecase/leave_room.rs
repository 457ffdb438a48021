//! UseCase: ルームから脱退する
//!
//! ディレクトリ上のメンバー登録を削除してから、チャネルのルームを退室する。

use std::sync::Arc;

use crate::{
    domain::{DirectoryService, RoomId, Username},
    session::ChatSession,
};

use super::error::LeaveRoomError;

/// ルーム脱退のユースケース
pub struct LeaveRoomUseCase {
    directory: Arc<dyn DirectoryService>,
    session: ChatSession,
}

impl LeaveRoomUseCase {
    pub fn new(directory: Arc<dyn DirectoryService>, session: ChatSession) -> Self {
        Self { directory, session }
    }

    /// メンバー登録の削除に失敗した場合はエラーを返し、ルームには留まる
    pub async fn execute(&self, room_id: RoomId, username: &Username) -> Result<(), LeaveRoomError> {
        // 1. ディレクトリのメンバー登録を削除
        self.directory.leave_room(room_id, username).await?;

        // 2. 参加中のルームであればチャネルからも退室
        if self.session.current_room_id() == Some(room_id) {
            self.session.leave_room();
        }
        tracing::info!("{} left room {}", username, room_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{DirectoryError, directory::MockDirectoryService},
        infrastructure::stomp::Command,
        usecase::testing::{connected_session, username},
    };

    #[tokio::test]
    async fn test_leave_room_removes_membership_then_leaves_channel() {
        // テスト項目: メンバー登録を削除した後、チャネルのルームから退室する
        // given (前提条件):
        let mut directory = MockDirectoryService::new();
        directory
            .expect_leave_room()
            .withf(|room_id, name| *room_id == RoomId::new(7) && name.as_str() == "alice")
            .times(1)
            .returning(|_, _| Ok(()));
        let (session, _server, mut peer) = connected_session("alice").await;
        session.join_room(RoomId::new(7));
        let _subscribe = peer.recv_frame().await.unwrap();
        let _join = peer.recv_frame().await.unwrap();
        let usecase = LeaveRoomUseCase::new(Arc::new(directory), session.clone());

        // when (操作):
        let result = usecase.execute(RoomId::new(7), &username("alice")).await;
        let leave = peer.recv_frame().await.unwrap();
        let unsubscribe = peer.recv_frame().await.unwrap();

        // then (期待する結果):
        assert!(result.is_ok());
        assert!(leave.body().contains("\"LEAVE\""));
        assert_eq!(unsubscribe.command(), Command::Unsubscribe);
        assert!(session.current_room_id().is_none());
    }

    #[tokio::test]
    async fn test_leave_room_failure_keeps_room_joined() {
        // テスト項目: メンバー登録の削除に失敗するとエラーが返り、ルームに留まる
        // given (前提条件):
        let mut directory = MockDirectoryService::new();
        directory.expect_leave_room().returning(|_, _| {
            Err(DirectoryError::Status {
                status: 503,
                url: "http://localhost:8080/api/rooms/7/participants/alice".to_string(),
            })
        });
        let (session, _server, mut peer) = connected_session("alice").await;
        session.join_room(RoomId::new(7));
        let _subscribe = peer.recv_frame().await.unwrap();
        let _join = peer.recv_frame().await.unwrap();
        let usecase = LeaveRoomUseCase::new(Arc::new(directory), session.clone());

        // when (操作):
        let result = usecase.execute(RoomId::new(7), &username("alice")).await;
        session.send_message("still here");
        let chat = peer.recv_frame().await.unwrap();

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(LeaveRoomError::Directory(DirectoryError::Status { status: 503, .. }))
        ));
        assert!(chat.body().contains("still here"));
        assert_eq!(session.current_room_id(), Some(RoomId::new(7)));
    }

    #[tokio::test]
    async fn test_leave_other_room_keeps_current_room() {
        // テスト項目: 参加中ではないルームから脱退しても、現在のルームには留まる
        // given (前提条件):
        let mut directory = MockDirectoryService::new();
        directory.expect_leave_room().returning(|_, _| Ok(()));
        let (session, _server, mut peer) = connected_session("alice").await;
        session.join_room(RoomId::new(7));
        let _subscribe = peer.recv_frame().await.unwrap();
        let _join = peer.recv_frame().await.unwrap();
        let usecase = LeaveRoomUseCase::new(Arc::new(directory), session.clone());

        // when (操作):
        usecase.execute(RoomId::new(9), &username("alice")).await.unwrap();
        session.send_message("sentinel");
        let next = peer.recv_frame().await.unwrap();

        // then (期待する結果):
        assert!(next.body().contains("sentinel"));
        assert_eq!(session.current_room_id(), Some(RoomId::new(7)));
    }
}
