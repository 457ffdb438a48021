//! UseCase: ログアウト処理

use std::sync::Arc;

use crate::{
    domain::{StoreError, UsernameStore},
    session::ChatSession,
};

/// ログアウトのユースケース
///
/// セッションを切断し、保存済みのユーザー名を削除する。
pub struct LogoutUseCase {
    store: Arc<dyn UsernameStore>,
    session: ChatSession,
}

impl LogoutUseCase {
    pub fn new(store: Arc<dyn UsernameStore>, session: ChatSession) -> Self {
        Self { store, session }
    }

    pub async fn execute(&self) -> Result<(), StoreError> {
        // 切断はルームからの退室 (LEAVE) も含む
        self.session.disconnect();
        self.store.clear().await?;
        tracing::info!("Logged out");
        Ok(())
    }
}
