//! Infrastructure layer: concrete implementations of the domain interfaces.

pub mod dto;
pub mod http;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod stomp;
pub mod store;
pub mod websocket;

pub use http::{DirectoryConfig, HttpDirectoryClient};
#[cfg(any(test, feature = "testing"))]
pub use memory::{MemoryConnector, MemoryPeer, MemoryServer, memory_pair};
pub use store::FileUsernameStore;
pub use websocket::WebSocketConnector;
