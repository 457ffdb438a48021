//! Terminal UI: command parsing, formatting and the interactive loop.

mod command;
mod error;
mod formatter;
mod prompt;
mod runner;

pub use command::{CommandError, UserCommand};
pub use error::ClientError;
pub use formatter::MessageFormatter;
pub use prompt::Prompt;
pub use runner::{ClientOptions, run_client};
