//! Media streaming module.
//!
//! Serves extracted media files with HTTP range support.
//!
//! # Routes
//!
//! - `GET /stream/{folder}/{filename}` - Direct file streaming with range support

mod direct;
mod range;

pub use direct::{serve_file, stream_file};
pub use range::{parse_range_header, ByteRange};

use axum::{routing::get, Router};

use crate::server::AppContext;

/// Create the streaming router.
pub fn stream_router() -> Router<AppContext> {
    Router::new().route("/:folder/:filename", get(stream_file))
}
