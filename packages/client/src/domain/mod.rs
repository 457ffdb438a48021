//! Domain layer for the chat client.
//!
//! This module contains the types and interfaces the session layer and the
//! use cases are written against. Concrete implementations live in the
//! infrastructure layer.

pub mod directory;
pub mod entity;
pub mod error;
pub mod reconnect;
pub mod store;
pub mod transport;
pub mod value_object;

pub use directory::DirectoryService;
pub use entity::{ChatMessage, ChatRoom, MessageType};
pub use error::{DirectoryError, StoreError, TransportError, ValueObjectError};
pub use reconnect::{Backoff, ReconnectPolicy};
pub use store::UsernameStore;
pub use transport::{Channel, Connector};
pub use value_object::{RoomId, Username};
