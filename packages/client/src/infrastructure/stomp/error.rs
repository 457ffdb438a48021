//! STOMP codec errors.

use thiserror::Error;

/// Errors raised while decoding STOMP frames
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("Unknown STOMP command: '{0}'")]
    UnknownCommand(String),

    /// Header line without a `:` separator
    #[error("Malformed header line: '{0}'")]
    MalformedHeader(String),

    #[error("Invalid escape sequence in header: '{0}'")]
    InvalidEscape(String),

    #[error("Invalid content-length: '{0}'")]
    InvalidContentLength(String),

    /// The byte after `content-length` bytes of body is not NUL
    #[error("Frame body is not terminated by NUL")]
    MissingNul,

    /// NUL found before the end of the header section
    #[error("Frame ended before its headers")]
    MalformedFrame,

    #[error("Frame is not valid UTF-8")]
    InvalidUtf8,

    #[error("Frame exceeds {0} bytes")]
    FrameTooLarge(usize),
}
