//! Incremental STOMP frame decoder.
//!
//! A WebSocket message may carry several frames, a partial frame, or only
//! heart-beat EOLs. The decoder buffers input until a frame is complete and
//! recovers from malformed frames by discarding up to the next NUL.

use super::{
    error::FrameError,
    frame::{Command, Frame, unescape},
};

/// Upper bound on buffered, still incomplete input
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Incremental STOMP frame decoder
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

/// Where the next frame lies in the buffer
enum Extent {
    Complete {
        header_end: usize,
        body_end: usize,
        frame_end: usize,
    },
    Invalid {
        error: FrameError,
        discard: usize,
    },
    Incomplete,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of channel input and return every frame it completes.
    ///
    /// Each malformed frame yields one `Err` and does not affect the frames
    /// around it.
    pub fn push(&mut self, chunk: &str) -> Vec<Result<Frame, FrameError>> {
        self.buffer.extend_from_slice(chunk.as_bytes());

        let mut frames = Vec::new();
        loop {
            self.skip_heartbeats();
            if self.buffer.is_empty() {
                break;
            }
            match self.next_extent() {
                Extent::Complete {
                    header_end,
                    body_end,
                    frame_end,
                } => {
                    let raw: Vec<u8> = self.buffer.drain(..frame_end).collect();
                    frames.push(parse_frame(&raw[..header_end], &raw[header_end..body_end]));
                }
                Extent::Invalid { error, discard } => {
                    self.buffer.drain(..discard);
                    frames.push(Err(error));
                }
                Extent::Incomplete => {
                    if self.buffer.len() > MAX_FRAME_BYTES {
                        self.buffer.clear();
                        frames.push(Err(FrameError::FrameTooLarge(MAX_FRAME_BYTES)));
                    }
                    break;
                }
            }
        }
        frames
    }

    /// Bytes buffered for a frame that is not complete yet
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    fn skip_heartbeats(&mut self) {
        let mut skip = 0;
        loop {
            match &self.buffer[skip..] {
                [b'\r', b'\n', ..] => skip += 2,
                [b'\n', ..] => skip += 1,
                _ => break,
            }
        }
        self.buffer.drain(..skip);
    }

    fn next_extent(&self) -> Extent {
        let buffer = &self.buffer;

        // header section ends at the first empty line
        let mut line_start = 0;
        let mut content_length: Option<Result<usize, String>> = None;
        let header_end = loop {
            let Some(offset) = buffer[line_start..]
                .iter()
                .position(|&b| b == b'\n' || b == b'\0')
            else {
                return Extent::Incomplete;
            };
            let end = line_start + offset;
            if buffer[end] == b'\0' {
                return Extent::Invalid {
                    error: FrameError::MalformedFrame,
                    discard: end + 1,
                };
            }
            let line = trim_cr(&buffer[line_start..end]);
            if line.is_empty() {
                break end + 1;
            }
            if line_start > 0 && content_length.is_none() {
                if let Some(raw) = line.strip_prefix(b"content-length:") {
                    let raw = String::from_utf8_lossy(raw).into_owned();
                    content_length = Some(raw.trim().parse::<usize>().map_err(|_| raw));
                }
            }
            line_start = end + 1;
        };

        match content_length {
            Some(Ok(length)) => {
                let body_end = match header_end.checked_add(length) {
                    Some(body_end) if length <= MAX_FRAME_BYTES => body_end,
                    // the declared body can never be buffered; drop up to the next NUL
                    _ => {
                        return match find_nul(buffer, header_end) {
                            Some(nul) => Extent::Invalid {
                                error: FrameError::FrameTooLarge(MAX_FRAME_BYTES),
                                discard: nul + 1,
                            },
                            None => Extent::Incomplete,
                        };
                    }
                };
                if buffer.len() <= body_end {
                    return Extent::Incomplete;
                }
                if buffer[body_end] != b'\0' {
                    return match find_nul(buffer, body_end) {
                        Some(nul) => Extent::Invalid {
                            error: FrameError::MissingNul,
                            discard: nul + 1,
                        },
                        None => Extent::Incomplete,
                    };
                }
                Extent::Complete {
                    header_end,
                    body_end,
                    frame_end: body_end + 1,
                }
            }
            Some(Err(raw)) => match find_nul(buffer, header_end) {
                Some(nul) => Extent::Invalid {
                    error: FrameError::InvalidContentLength(raw),
                    discard: nul + 1,
                },
                None => Extent::Incomplete,
            },
            None => match find_nul(buffer, header_end) {
                Some(nul) => Extent::Complete {
                    header_end,
                    body_end: nul,
                    frame_end: nul + 1,
                },
                None => Extent::Incomplete,
            },
        }
    }
}

fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn find_nul(buffer: &[u8], from: usize) -> Option<usize> {
    buffer[from..]
        .iter()
        .position(|&b| b == b'\0')
        .map(|offset| from + offset)
}

fn parse_frame(head: &[u8], body: &[u8]) -> Result<Frame, FrameError> {
    let head = std::str::from_utf8(head).map_err(|_| FrameError::InvalidUtf8)?;
    let mut lines = head.lines();

    let command: Command = lines.next().unwrap_or_default().parse()?;
    let escape = command.escapes_headers();

    let mut headers = Vec::new();
    for line in lines.filter(|line| !line.is_empty()) {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| FrameError::MalformedHeader(line.to_string()))?;
        if escape {
            headers.push((unescape(name)?, unescape(value)?));
        } else {
            headers.push((name.to_string(), value.to_string()));
        }
    }

    let body = String::from_utf8(body.to_vec()).map_err(|_| FrameError::InvalidUtf8)?;
    Ok(Frame::from_parts(command, headers, body))
}
