//! UseCase: ルームを閉じる
//!
//! 画面からルームを閉じるだけで、ディレクトリ上のメンバー登録は残す。

use crate::session::{ChatSession, Subscription};

/// ルームを閉じるユースケース
pub struct CloseRoomUseCase {
    session: ChatSession,
}

impl CloseRoomUseCase {
    pub fn new(session: ChatSession) -> Self {
        Self { session }
    }

    pub fn execute(&self, subscription: Subscription) {
        // 1. 受信ハンドラの登録を解除
        subscription.unsubscribe();

        // 2. チャネルのルームから退室（LEAVE の送信と購読解除）
        self.session.leave_room();
        tracing::info!("Closed room view");
    }
}
