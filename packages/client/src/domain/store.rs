//! Local persisted state interface.

use async_trait::async_trait;

use super::{error::StoreError, value_object::Username};

/// Holds the last-used username so a session can be resumed on startup
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsernameStore: Send + Sync {
    /// Saved username, or `None` if nothing is stored
    async fn load(&self) -> Result<Option<Username>, StoreError>;

    async fn save(&self, username: &Username) -> Result<(), StoreError>;

    /// Forget the saved username. Clearing an empty store is not an error.
    async fn clear(&self) -> Result<(), StoreError>;
}
