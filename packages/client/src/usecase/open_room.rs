//! UseCase: ルームを開く
//!
//! メンバー登録・履歴の取得・チャネルへの参加・受信ハンドラの登録を
//! まとめて行う。

use std::sync::Arc;

use crate::{
    domain::{ChatMessage, DirectoryError, DirectoryService, RoomId},
    session::{ChatSession, Subscription},
};

/// 履歴取得件数の既定値
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// 開いたルームの情報
#[derive(Debug)]
pub struct OpenedRoom {
    pub room_id: RoomId,
    /// 古い順に並んだ直近の履歴
    pub history: Vec<ChatMessage>,
    /// 履歴の取得に失敗した場合のエラー（ルームは開かれている）
    pub history_error: Option<DirectoryError>,
    /// 受信ハンドラの登録。ルームを閉じるときに解除する
    pub subscription: Subscription,
}

/// ルームを開くユースケース
pub struct OpenRoomUseCase {
    directory: Arc<dyn DirectoryService>,
    session: ChatSession,
    history_limit: usize,
}

impl OpenRoomUseCase {
    pub fn new(directory: Arc<dyn DirectoryService>, session: ChatSession) -> Self {
        Self {
            directory,
            session,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }

    /// ルームを開き、以降の受信メッセージを `handler` に渡す
    ///
    /// メンバー登録と履歴取得の失敗ではルームを開くことをやめない。
    pub async fn execute<F>(&self, room_id: RoomId, handler: F) -> OpenedRoom
    where
        F: Fn(&ChatMessage) + Send + Sync + 'static,
    {
        // 1. ディレクトリにメンバーとして登録
        match self.session.username() {
            Some(username) => {
                if let Err(e) = self.directory.join_room(room_id, &username).await {
                    tracing::warn!("Failed to record membership of room {}: {}", room_id, e);
                }
            }
            None => tracing::debug!("Not logged in, skipping membership of room {}", room_id),
        }

        // 2. 履歴を取得（新しい順で返るので古い順に並べ替える）
        let (history, history_error) = match self
            .directory
            .recent_messages(room_id, self.history_limit)
            .await
        {
            Ok(mut messages) => {
                messages.reverse();
                (messages, None)
            }
            Err(e) => {
                tracing::warn!("Failed to fetch history of room {}: {}", room_id, e);
                (Vec::new(), Some(e))
            }
        };

        // 3. チャネルのルームに参加し、受信ハンドラを登録
        self.session.join_room(room_id);
        let subscription = self.session.subscribe(handler);
        tracing::info!("Opened room {} ({} messages in history)", room_id, history.len());

        OpenedRoom {
            room_id,
            history,
            history_error,
            subscription,
        }
    }
}
