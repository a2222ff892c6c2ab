//! rarstream - fetch RAR archives over HTTP and stream the video inside
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod resolve;
pub mod retention;
pub mod server;
pub mod streaming;
