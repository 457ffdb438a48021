//! Data Transfer Objects (DTOs) for the chat client.
//!
//! DTOs are organized by protocol:
//! - `websocket`: message bodies carried on the STOMP channel
//! - `http`: directory/history API request and response bodies

pub mod conversion;
pub mod http;
pub mod websocket;
