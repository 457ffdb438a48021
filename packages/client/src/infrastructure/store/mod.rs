//! Local persisted state.

mod file;

pub use file::FileUsernameStore;
