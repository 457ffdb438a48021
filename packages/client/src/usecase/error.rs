//! UseCase layer error types.

use thiserror::Error;

use crate::domain::{DirectoryError, StoreError, ValueObjectError};

/// Errors of [`LoginUseCase`](super::LoginUseCase)
#[derive(Debug, Error)]
pub enum LoginError {
    #[error(transparent)]
    InvalidUsername(#[from] ValueObjectError),

    /// The saved username could not be read
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors of [`CreateRoomUseCase`](super::CreateRoomUseCase)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateRoomError {
    #[error("Room name must not be empty")]
    EmptyName,

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// Errors of [`LeaveRoomUseCase`](super::LeaveRoomUseCase)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaveRoomError {
    /// The membership record was not removed; the room is still joined
    #[error("Failed to leave room: {0}")]
    Directory(#[from] DirectoryError),
}
