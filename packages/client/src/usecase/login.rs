//! UseCase: ログイン処理
//!
//! ユーザー名を検証・保存してセッションを接続する。前回のユーザー名が
//! 保存されていれば、それを使って自動的に再開することもできる。

use std::sync::Arc;

use crate::{
    domain::{Username, UsernameStore},
    session::ChatSession,
};

use super::error::LoginError;

/// ログインのユースケース
pub struct LoginUseCase {
    store: Arc<dyn UsernameStore>,
    session: ChatSession,
}

impl LoginUseCase {
    pub fn new(store: Arc<dyn UsernameStore>, session: ChatSession) -> Self {
        Self { store, session }
    }

    /// 指定されたユーザー名でログインする
    ///
    /// 保存に失敗してもログインは続行する（次回の自動再開ができないだけ）。
    pub async fn execute(&self, username: &str) -> Result<Username, LoginError> {
        // 1. ユーザー名の検証
        let username = Username::new(username.to_string())?;

        // 2. 次回起動時のために保存
        if let Err(e) = self.store.save(&username).await {
            tracing::warn!("Failed to save username: {}", e);
        }

        // 3. 接続開始（完了は接続状態の変化で通知される）
        self.session.connect(username.clone());
        tracing::info!("Logging in as {}", username);
        Ok(username)
    }

    /// 保存済みのユーザー名があればそれでログインする
    ///
    /// # Returns
    ///
    /// * `Ok(Some(username))` - 保存済みユーザーで接続を開始した
    /// * `Ok(None)` - 保存済みユーザーなし
    pub async fn resume(&self) -> Result<Option<Username>, LoginError> {
        let Some(username) = self.store.load().await? else {
            return Ok(None);
        };

        self.session.connect(username.clone());
        tracing::info!("Resuming session as {}", username);
        Ok(Some(username))
    }
}
