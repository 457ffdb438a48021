use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;

use crate::domain::{StoreError, Username, UsernameStore};

/// Keeps the last-used username in a single text file
#[derive(Debug, Clone)]
pub struct FileUsernameStore {
    path: PathBuf,
}

impl FileUsernameStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl UsernameStore for FileUsernameStore {
    async fn load(&self) -> Result<Option<Username>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // blank content counts as no saved user
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(Username::new(content)?))
    }

    async fn save(&self, username: &Username) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, username.as_str()).await?;
        tracing::debug!("Saved username to {}", self.path.display());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!("Removed {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
