//! Error types for the terminal client.

use thiserror::Error;

use crate::{
    domain::{DirectoryError, StoreError},
    usecase::{CreateRoomError, LeaveRoomError, LoginError},
};

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Login(#[from] LoginError),

    #[error(transparent)]
    CreateRoom(#[from] CreateRoomError),

    #[error(transparent)]
    LeaveRoom(#[from] LeaveRoomError),

    #[error("Failed to forget the saved user: {0}")]
    Logout(#[from] StoreError),

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Not connected")]
    NotConnected,

    #[error("No room is open (use /join <id>)")]
    NoOpenRoom,
}
