//! Rarstream-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across rarstream:
//!
//! - **Error Handling**: The unified error type and its HTTP status mapping
//! - **Path Utilities**: Media/archive extension checks and path-component safety
//! - **Core Types**: Archive jobs, extracted assets, and stream references
//!
//! # Examples
//!
//! ```
//! use rarstream_common::paths::is_media_file;
//! use rarstream_common::StreamReference;
//! use std::path::Path;
//!
//! assert!(is_media_file(Path::new("episode1.MKV")));
//!
//! let reference = StreamReference::new("170000000-show", "episode 1.mp4");
//! assert_eq!(reference.stream_path(), "/stream/170000000-show/episode%201.mp4");
//! ```

pub mod error;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
