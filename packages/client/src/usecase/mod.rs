//! UseCase layer: ユーザー操作ごとのアプリケーションロジック
//!
//! 各ユースケースはドメインのトレイト (`DirectoryService`, `UsernameStore`) と
//! `ChatSession` だけに依存する。

mod close_room;
mod create_room;
mod error;
mod leave_room;
mod list_rooms;
mod login;
mod logout;
mod open_room;

#[cfg(test)]
pub(crate) mod testing;

pub use close_room::CloseRoomUseCase;
pub use create_room::CreateRoomUseCase;
pub use error::{CreateRoomError, LeaveRoomError, LoginError};
pub use leave_room::LeaveRoomUseCase;
pub use list_rooms::ListRoomsUseCase;
pub use login::LoginUseCase;
pub use logout::LogoutUseCase;
pub use open_room::{DEFAULT_HISTORY_LIMIT, OpenRoomUseCase, OpenedRoom};
