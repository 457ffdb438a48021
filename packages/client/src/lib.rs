//! Hiroba chat client library.
//!
//! This library provides the session layer of a real-time group chat client:
//! a single STOMP-over-WebSocket channel shared across room switches and
//! reconnects, a room directory client over HTTP, and a terminal front end.

// layers
pub mod domain;
pub mod infrastructure;
pub mod session;
pub mod ui;
pub mod usecase;
